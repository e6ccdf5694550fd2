//! A file-backed JSON document store keyed by user and collection.
//!
//! Each user has a directory under the data directory holding one JSON file per
//! [Collection]:
//!
//! ```text
//! users/
//!   {user}/
//!     categories.json
//!     current_month_transactions.json
//!     past_data.json
//!     settings.json
//! ```
//!
//! Reads are unsynchronized and never fail: a missing or unreadable file
//! yields the collection's default, marked with where it came from. Writes
//! replace the whole document atomically and are serialized by a single lock.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::{Error, record::TransactionRecord, settings::Settings, user::UserName};

/// The user's categories, mapping each category name to its subcategories.
pub type Categories = Map<String, Value>;

/// An ordered list of transaction records, used for staging and history.
pub type Transactions = Vec<TransactionRecord>;

/// The logical documents stored for each user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// The category to subcategories mapping.
    Categories,
    /// Transactions that have not been committed yet.
    Stage,
    /// The committed transaction history.
    Past,
    /// Display settings.
    Settings,
}

impl Collection {
    /// Every collection, in the order their files are created.
    pub const ALL: [Collection; 4] = [
        Collection::Categories,
        Collection::Stage,
        Collection::Past,
        Collection::Settings,
    ];

    /// The name of the file the collection is stored in.
    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Categories => "categories.json",
            Collection::Stage => "current_month_transactions.json",
            Collection::Past => "past_data.json",
            Collection::Settings => "settings.json",
        }
    }

    fn default_document(self) -> Result<Value, Error> {
        let document = match self {
            Collection::Categories => Value::Object(Categories::new()),
            Collection::Stage | Collection::Past => Value::Array(Vec::new()),
            Collection::Settings => serde_json::to_value(Settings::default())?,
        };

        Ok(document)
    }
}

/// Where the value of a [Document] came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    /// The value was parsed from the file on disk.
    Stored,
    /// The file does not exist, the value is the collection's default.
    Missing,
    /// The file exists but could not be read or parsed, the value is the
    /// collection's default.
    ///
    /// The string describes what went wrong.
    Unreadable(String),
}

/// The result of reading a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<T> {
    /// The parsed document, or the default if it could not be read.
    pub value: T,
    /// Whether `value` was read from disk or is a default.
    pub source: DocumentSource,
}

impl<T> Document<T> {
    /// Whether the value is a default that stands in for a missing or
    /// unreadable file.
    pub fn is_default(&self) -> bool {
        self.source != DocumentSource::Stored
    }

    /// Take the value, discarding where it came from.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Take the value in order to change it and write it back.
    ///
    /// # Errors
    /// Returns [Error::UnreadableDocument] if the file of `collection` exists
    /// but could not be read, as writing back the default would destroy it.
    pub fn into_writable(self, collection: Collection) -> Result<T, Error> {
        match self.source {
            DocumentSource::Unreadable(reason) => {
                tracing::error!(
                    "refusing to write over {}: {reason}",
                    collection.file_name()
                );
                Err(Error::UnreadableDocument(collection.file_name().to_owned()))
            }
            DocumentSource::Stored | DocumentSource::Missing => Ok(self.value),
        }
    }
}

/// Stores JSON documents on disk, one directory per user.
#[derive(Debug)]
pub struct DocumentStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns [Error::StoreError] if the directory cannot be created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// The directory holding every user's documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user: &UserName) -> PathBuf {
        self.root.join(user.as_ref())
    }

    /// The path of the file backing `collection` for `user`.
    pub fn path(&self, user: &UserName, collection: Collection) -> PathBuf {
        self.user_dir(user).join(collection.file_name())
    }

    /// Read a collection for a user.
    ///
    /// Never fails: if the file is missing or cannot be parsed as `T`, the
    /// default value is returned and the returned [DocumentSource] says why.
    pub fn read<T>(&self, user: &UserName, collection: Collection) -> Document<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(user, collection);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Document {
                    value: T::default(),
                    source: DocumentSource::Missing,
                };
            }
            Err(error) => {
                tracing::warn!("could not read {path:?}, using the default: {error}");
                return Document {
                    value: T::default(),
                    source: DocumentSource::Unreadable(error.to_string()),
                };
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => Document {
                value,
                source: DocumentSource::Stored,
            },
            Err(error) => {
                tracing::warn!("could not parse {path:?}, using the default: {error}");
                Document {
                    value: T::default(),
                    source: DocumentSource::Unreadable(error.to_string()),
                }
            }
        }
    }

    /// Read a list of transaction records for a user.
    ///
    /// Like [DocumentStore::read], except that items of the list that are not
    /// JSON objects are skipped instead of making the whole document
    /// unreadable.
    pub fn read_records(&self, user: &UserName, collection: Collection) -> Document<Transactions> {
        let Document { value, source } = self.read::<Vec<Value>>(user, collection);
        let item_count = value.len();

        let records: Transactions = value
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(fields) => Some(TransactionRecord::new(fields)),
                _ => None,
            })
            .collect();

        if records.len() < item_count {
            tracing::warn!(
                "skipped {} items of {} for {user} that are not objects",
                item_count - records.len(),
                collection.file_name()
            );
        }

        Document {
            value: records,
            source,
        }
    }

    /// Replace a collection for a user.
    ///
    /// The document is written to a temporary file in the same directory,
    /// flushed to disk and then renamed over the old file, so readers see
    /// either the old or the new document and never a partial one.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::StoreLockError] if the write lock is poisoned,
    /// - [Error::JSONSerializationError] if `document` cannot be serialized,
    /// - [Error::StoreError] if the file cannot be written.
    pub fn write<T>(
        &self,
        user: &UserName,
        collection: Collection,
        document: &T,
    ) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(user, collection);
        let dir = self.user_dir(user);

        let _guard = self
            .write_lock
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire the store write lock: {error}"))
            .map_err(|_| Error::StoreLockError)?;

        fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|error| Error::from(error.error))?;

        tracing::debug!("wrote {path:?}");

        Ok(())
    }

    /// Create the user's directory and write the default document for every
    /// collection that does not have a file yet.
    ///
    /// # Errors
    /// Returns an error if a default document cannot be written.
    pub fn ensure_user(&self, user: &UserName) -> Result<(), Error> {
        for collection in Collection::ALL {
            if !self.path(user, collection).exists() {
                self.write(user, collection, &collection.default_document()?)?;
            }
        }

        Ok(())
    }

    /// List the names of every user with a directory in the store, sorted.
    ///
    /// # Errors
    /// Returns [Error::StoreError] if the data directory cannot be listed.
    pub fn list_users(&self) -> Result<Vec<String>, Error> {
        let mut users = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;

            if entry.file_type()?.is_dir() {
                users.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        users.sort();

        Ok(users)
    }
}
