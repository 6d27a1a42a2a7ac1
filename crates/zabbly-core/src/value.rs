// ── Declarative values ──
//
// The value model shared by schemas, the state store and the collection
// builders. Sets are ordered sets so two sets compare equal by content
// regardless of the order they were declared in.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use strum::IntoStaticStr;

/// Nested block: field name → value.
pub type Block = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<FieldValue>),
    Set(BTreeSet<FieldValue>),
    Block(Block),
}

impl FieldValue {
    /// Variant name, for type-mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        self.into()
    }

    /// `true` for null and for the zero value of every kind.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Set(items) => items.is_empty(),
            Self::Block(block) => block.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<FieldValue>> {
        match self {
            Self::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            _ => None,
        }
    }

    /// Elements of a list or set, in list order or set order.
    pub fn elements(&self) -> Vec<&FieldValue> {
        match self {
            Self::List(items) => items.iter().collect(),
            Self::Set(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Build an ordered list of strings.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    /// Build an unordered set of strings.
    pub fn string_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    /// Build a nested block from `(name, value)` pairs.
    pub fn block<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        Self::Block(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// JSON rendering, used for RPC filters built from declarative values.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => items.iter().map(Self::to_json).collect(),
            Self::Set(items) => items.iter().map(Self::to_json).collect(),
            Self::Block(block) => Value::Object(
                block
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<Block> for FieldValue {
    fn from(block: Block) -> Self {
        Self::Block(block)
    }
}

// ── Block accessors ─────────────────────────────────────────────────

/// Typed reads from a nested block whose defaults have already been
/// resolved. Missing or mistyped entries read as the zero value.
pub trait BlockExt {
    fn text(&self, key: &str) -> String;
    fn flag(&self, key: &str) -> bool;
    fn int(&self, key: &str) -> i64;
    fn texts(&self, key: &str) -> Vec<String>;
}

impl BlockExt for Block {
    fn text(&self, key: &str) -> String {
        self.get(key)
            .and_then(FieldValue::as_str)
            .unwrap_or_default()
            .to_owned()
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    fn int(&self, key: &str) -> i64 {
        self.get(key).and_then(FieldValue::as_int).unwrap_or(0)
    }

    fn texts(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.elements()
                    .into_iter()
                    .filter_map(FieldValue::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}
