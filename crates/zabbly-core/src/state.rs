// ── Declarative state ──
//
// The engine reads desired values from, and writes observed values back
// to, a `StateStore`. Hosts embedding the engine implement the trait over
// their own storage; `ResourceData` is the in-memory implementation.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use crate::error::CoreError;
use crate::schema::FieldSet;
use crate::value::{Block, FieldValue};

/// Typed access to one resource instance's declarative state.
///
/// `get` resolves schema defaults; `configured` returns only what was
/// explicitly set. `change` compares the last applied value with the
/// current one.
pub trait StateStore: Send + Sync {
    /// Remote identity; empty while the resource is absent.
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Whether the backing schema declares `field`.
    fn declares(&self, field: &str) -> bool;

    /// Explicitly set value, without defaults.
    fn configured(&self, field: &str) -> Option<&FieldValue>;

    /// Names of every explicitly set field.
    fn configured_fields(&self) -> Vec<String>;

    /// Effective value: configured, else schema default, else zero.
    fn get(&self, field: &str) -> FieldValue;

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError>;

    /// `(old, new)`: the last applied value and the current one.
    fn change(&self, field: &str) -> (FieldValue, FieldValue);

    fn has_change(&self, field: &str) -> bool {
        let (old, new) = self.change(field);
        old != new
    }

    fn get_str(&self, field: &str) -> String {
        match self.get(field) {
            FieldValue::String(s) => s,
            _ => String::new(),
        }
    }

    fn get_bool(&self, field: &str) -> bool {
        self.get(field).as_bool().unwrap_or(false)
    }

    fn get_int(&self, field: &str) -> i64 {
        self.get(field).as_int().unwrap_or(0)
    }

    /// String elements of a list (in order) or set (in set order).
    fn get_strings(&self, field: &str) -> Vec<String> {
        self.get(field)
            .elements()
            .into_iter()
            .filter_map(FieldValue::as_str)
            .map(str::to_owned)
            .collect()
    }

    /// Block elements of a list (in order) or set (in set order).
    fn get_blocks(&self, field: &str) -> Vec<Block> {
        self.get(field)
            .elements()
            .into_iter()
            .filter_map(FieldValue::as_block)
            .cloned()
            .collect()
    }

    fn get_set(&self, field: &str) -> BTreeSet<FieldValue> {
        match self.get(field) {
            FieldValue::Set(items) => items,
            FieldValue::List(items) => items.into_iter().collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Set a string only when `value` is present.
    fn set_opt_str(&mut self, field: &str, value: Option<&str>) -> Result<(), CoreError> {
        match value {
            Some(v) => self.set(field, FieldValue::from(v)),
            None => Ok(()),
        }
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// Schema-aware in-memory `StateStore`.
///
/// `applied` holds the values of the last successful apply; `current`
/// starts as a copy of it and receives both configuration and values read
/// back from the remote.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<FieldSet>,
    id: String,
    applied: Block,
    current: Block,
}

impl ResourceData {
    /// Fresh, absent resource.
    pub fn new(schema: Arc<FieldSet>) -> Self {
        Self {
            schema,
            id: String::new(),
            applied: Block::new(),
            current: Block::new(),
        }
    }

    /// Existing resource whose last applied values are `applied`.
    pub fn existing<I, K>(schema: Arc<FieldSet>, id: impl Into<String>, applied: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let applied: Block = applied
            .into_iter()
            .map(|(k, v)| {
                let k = k.into();
                let v = match schema.get(&k) {
                    Some(desc) => desc.normalize(&v),
                    None => v,
                };
                (k, v)
            })
            .collect();
        Self {
            schema,
            id: id.into(),
            current: applied.clone(),
            applied,
        }
    }

    /// Builder-style `set` for configuring desired values.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Result<Self, CoreError> {
        self.set(field, value.into())?;
        Ok(self)
    }

    pub fn schema(&self) -> &Arc<FieldSet> {
        &self.schema
    }

    /// Current values, as set (defaults not applied).
    pub fn values(&self) -> &Block {
        &self.current
    }

    /// Make the current values the new baseline for change detection.
    pub fn commit(&mut self) {
        self.applied = self.current.clone();
    }

    /// Drop a configured value so the schema default applies again.
    pub fn unset(&mut self, field: &str) {
        self.current.remove(field);
    }
}

impl StateStore for ResourceData {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        trace!(%id, "state identity");
        self.id = id;
    }

    fn declares(&self, field: &str) -> bool {
        self.schema.contains(field)
    }

    fn configured(&self, field: &str) -> Option<&FieldValue> {
        self.current.get(field)
    }

    fn configured_fields(&self) -> Vec<String> {
        self.current.keys().cloned().collect()
    }

    fn get(&self, field: &str) -> FieldValue {
        match self.schema.get(field) {
            Some(desc) => desc.resolve(self.current.get(field)),
            None => FieldValue::Null,
        }
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        let desc = self
            .schema
            .get(field)
            .ok_or_else(|| CoreError::UnknownField {
                field: field.to_owned(),
            })?;
        let value = desc.normalize(&value);
        self.current.insert(field.to_owned(), value);
        Ok(())
    }

    fn change(&self, field: &str) -> (FieldValue, FieldValue) {
        match self.schema.get(field) {
            Some(desc) => (
                desc.resolve(self.applied.get(field)),
                desc.resolve(self.current.get(field)),
            ),
            None => (FieldValue::Null, FieldValue::Null),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::{Element, FieldDescriptor};

    fn schema() -> Arc<FieldSet> {
        Arc::new(FieldSet::new([
            FieldDescriptor::string("delay").default("1m"),
            FieldDescriptor::set("templates", Element::String),
            FieldDescriptor::bool("enabled").default(true),
        ]))
    }

    #[test]
    fn get_applies_defaults_until_set() {
        let mut data = ResourceData::new(schema());
        assert_eq!(data.get_str("delay"), "1m");
        assert!(data.get_bool("enabled"));
        assert!(data.configured("delay").is_none());

        data.set("delay", "5m".into()).unwrap();
        data.set("enabled", false.into()).unwrap();
        assert_eq!(data.get_str("delay"), "5m");
        assert!(!data.get_bool("enabled"));
    }

    #[test]
    fn set_rejects_undeclared_fields() {
        let mut data = ResourceData::new(schema());
        let err = data.set("bogus", "x".into()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownField { .. }));
    }

    #[test]
    fn change_compares_applied_and_current() {
        let mut data = ResourceData::existing(
            schema(),
            "10",
            [("templates", FieldValue::string_set(["10", "11"]))],
        );
        assert!(!data.has_change("templates"));

        data.set("templates", FieldValue::strings(["12", "11"])).unwrap();
        let (old, new) = data.change("templates");
        assert_eq!(old, FieldValue::string_set(["10", "11"]));
        assert_eq!(new, FieldValue::string_set(["11", "12"]));

        data.commit();
        assert!(!data.has_change("templates"));
    }

    #[test]
    fn list_input_for_set_field_is_normalized() {
        let data = ResourceData::new(schema())
            .with("templates", FieldValue::strings(["b", "a", "b"]))
            .unwrap();
        assert_eq!(data.get_strings("templates"), vec!["a", "b"]);
    }
}
