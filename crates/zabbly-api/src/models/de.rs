// Lenient deserializers for shapes the remote API changes between
// versions or depending on the object it describes.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `details` and similar sub-objects come back as `[]` when the parent has
/// none (e.g. `details` on a non-SNMP interface).
pub fn object_or_empty<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        value => T::deserialize(value).map(Some).map_err(D::Error::custom),
    }
}

/// HTTP headers: an object on 5.0+, `[]` when empty, and a
/// `"Name: value\r\n"` block on older servers.
pub fn header_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(BTreeMap::new()),
        Value::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(s) => Ok((name, s)),
                other => Err(D::Error::custom(format!(
                    "header '{name}' has non-string value {other}"
                ))),
            })
            .collect(),
        Value::String(block) => Ok(block
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
            .collect()),
        other => Err(D::Error::custom(format!("unexpected headers value {other}"))),
    }
}

/// Application references: plain ids on write, `{"applicationid": ..}`
/// objects when read back with `selectApplications`.
pub fn application_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    id_list(deserializer, "applicationid")
}

fn id_list<'de, D>(deserializer: D, key: &str) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<Value>::deserialize(deserializer)?;
    items
        .into_iter()
        .map(|item| match item {
            Value::String(id) => Ok(id),
            Value::Object(mut obj) => match obj.remove(key) {
                Some(Value::String(id)) => Ok(id),
                _ => Err(D::Error::custom(format!("object without '{key}'"))),
            },
            other => Err(D::Error::custom(format!("unexpected reference {other}"))),
        })
        .collect()
}
