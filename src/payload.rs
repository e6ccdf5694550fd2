//! Shape checks for request bodies that carry whole documents.
//!
//! Only the top-level shape is validated: an object where an object is
//! expected, a list of objects where records are expected. What is inside is
//! stored as the client sent it.

use serde_json::{Map, Value};

use crate::{Error, record::TransactionRecord};

/// A JSON object request body.
pub type Payload = Map<String, Value>;

/// Get the value of the first of `keys` that is present and not blank.
///
/// `null` and empty lists count as blank, so a client sending
/// `{"transactions": [], "items": [...]}` gets `items`.
pub fn first_present<'a>(payload: &'a Payload, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| !is_blank(value))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Check that `value` is a JSON object.
///
/// # Errors
/// Returns [Error::InvalidPayload] with `message` if it is not.
pub fn expect_object(value: &Value, message: &str) -> Result<Map<String, Value>, Error> {
    match value {
        Value::Object(object) => Ok(object.clone()),
        _ => Err(Error::InvalidPayload(message.to_owned())),
    }
}

/// Check that `value` is a list of JSON objects and convert it to records.
///
/// # Errors
/// Returns [Error::InvalidPayload] with `message` if it is not a list, or if
/// any item in the list is not an object.
pub fn expect_records(value: &Value, message: &str) -> Result<Vec<TransactionRecord>, Error> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::InvalidPayload(message.to_owned()))?;

    items
        .iter()
        .map(|item| match item {
            Value::Object(fields) => Ok(TransactionRecord::new(fields.clone())),
            _ => Err(Error::InvalidPayload(message.to_owned())),
        })
        .collect()
}
