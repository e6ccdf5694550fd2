//! Helpers shared by the unit tests.

use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use crate::{
    app_state::DocumentState,
    record::TransactionRecord,
    store::DocumentStore,
    user::{CurrentUser, UserName},
};

/// The user most tests act as.
pub(crate) const TEST_USER: &str = "tester";

/// Create document state backed by a temporary directory.
///
/// The directory is deleted when the returned [TempDir] is dropped, so keep it
/// alive for the duration of the test.
#[track_caller]
pub(crate) fn get_test_state() -> (TempDir, DocumentState) {
    let dir = tempfile::tempdir().expect("Could not create temporary directory");
    let store = DocumentStore::new(dir.path()).expect("Could not create document store");

    (
        dir,
        DocumentState {
            store: Arc::new(store),
        },
    )
}

pub(crate) fn test_user() -> CurrentUser {
    CurrentUser(UserName::new_unchecked(TEST_USER))
}

/// Convert a JSON array of objects into transaction records.
#[track_caller]
pub(crate) fn records(value: Value) -> Vec<TransactionRecord> {
    serde_json::from_value(value).expect("Could not create test records")
}
