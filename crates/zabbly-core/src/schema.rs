// ── Field schemas ──
//
// Field descriptors, composable descriptor sets and the two
// specialisations (writable resource, read-only lookup). Every operation
// here returns a new value; fragments are never modified in place.

use std::collections::BTreeMap;
use std::net::IpAddr;

use strum::Display;

use crate::error::CoreError;
use crate::state::StateStore;
use crate::value::{Block, FieldValue};

// ── Kinds ───────────────────────────────────────────────────────────

/// Element type of a list or set field.
#[derive(Debug, Clone, PartialEq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Element {
    String,
    Block(FieldSet),
}

#[derive(Debug, Clone, PartialEq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    String,
    Int,
    Bool,
    List(Element),
    Set(Element),
    /// String → string map, stored as a block of strings.
    Map,
}

impl FieldKind {
    /// Value of an unset field without a default.
    pub fn zero(&self) -> FieldValue {
        match self {
            Self::String => FieldValue::String(String::new()),
            Self::Int => FieldValue::Int(0),
            Self::Bool => FieldValue::Bool(false),
            Self::List(_) => FieldValue::List(Vec::new()),
            Self::Set(_) => FieldValue::Set(std::collections::BTreeSet::new()),
            Self::Map => FieldValue::Block(Block::new()),
        }
    }

    fn expected(&self) -> String {
        match self {
            Self::List(el) => format!("list of {el}"),
            Self::Set(el) => format!("set of {el}"),
            other => other.to_string(),
        }
    }

    /// Coerce a configured value into canonical form: lists become sets
    /// for set fields and nested blocks get their defaults filled in.
    fn normalize(&self, value: &FieldValue) -> FieldValue {
        match (self, value) {
            (Self::List(el), FieldValue::List(items)) => {
                FieldValue::List(items.iter().map(|i| el.normalize(i)).collect())
            }
            (Self::Set(el), FieldValue::List(items)) => {
                FieldValue::Set(items.iter().map(|i| el.normalize(i)).collect())
            }
            (Self::Set(el), FieldValue::Set(items)) => {
                FieldValue::Set(items.iter().map(|i| el.normalize(i)).collect())
            }
            _ => value.clone(),
        }
    }

    fn check(
        &self,
        path: &str,
        value: &FieldValue,
        validator: Option<&Validator>,
    ) -> Result<(), CoreError> {
        match (self, value) {
            (Self::String, FieldValue::String(_)) | (Self::Int, FieldValue::Int(_)) => {
                validator.map_or(Ok(()), |v| v.check(path, value))
            }
            (Self::Bool, FieldValue::Bool(_)) => Ok(()),
            (Self::List(el) | Self::Set(el), FieldValue::List(items)) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| el.check(&format!("{path}.{i}"), item, validator)),
            (Self::Set(el), FieldValue::Set(items)) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| el.check(&format!("{path}.{i}"), item, validator)),
            (Self::Map, FieldValue::Block(entries)) => {
                entries.iter().try_for_each(|(key, entry)| {
                    Element::String.check(&format!("{path}.{key}"), entry, validator)
                })
            }
            (kind, other) => Err(CoreError::TypeMismatch {
                field: path.to_owned(),
                expected: kind.expected(),
                found: other.kind_name(),
            }),
        }
    }
}

impl Element {
    fn normalize(&self, value: &FieldValue) -> FieldValue {
        match (self, value) {
            (Self::Block(fields), FieldValue::Block(block)) => FieldValue::Block(fields.fill(block)),
            _ => value.clone(),
        }
    }

    fn check(
        &self,
        path: &str,
        value: &FieldValue,
        validator: Option<&Validator>,
    ) -> Result<(), CoreError> {
        match (self, value) {
            (Self::String, FieldValue::String(_)) => {
                validator.map_or(Ok(()), |v| v.check(path, value))
            }
            (Self::Block(fields), FieldValue::Block(block)) => fields.validate_block(path, block),
            (el, other) => Err(CoreError::TypeMismatch {
                field: path.to_owned(),
                expected: el.to_string(),
                found: other.kind_name(),
            }),
        }
    }
}

// ── Validators ──────────────────────────────────────────────────────

/// Value predicates attached to descriptors. Collection validators apply
/// to each element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    NotWhitespace,
    /// Remote object identifier: decimal digits only.
    Numeric,
    Decimal,
    OneOf(Vec<&'static str>),
    IpAddress,
    /// Inclusive range; strings are parsed, user macros (`{$...}`) pass.
    IntRange(i64, i64),
    HttpUrl,
}

impl Validator {
    pub fn check(&self, path: &str, value: &FieldValue) -> Result<(), CoreError> {
        let fail = |reason: String| Err(CoreError::validation(path, reason));
        match (self, value) {
            (Self::IntRange(lo, hi), FieldValue::Int(i)) => {
                if (*lo..=*hi).contains(i) {
                    Ok(())
                } else {
                    fail(format!("{i} is outside {lo}..={hi}"))
                }
            }
            (Self::IntRange(lo, hi), FieldValue::String(s)) => {
                if s.starts_with("{$") {
                    return Ok(());
                }
                match s.parse::<i64>() {
                    Ok(i) if (*lo..=*hi).contains(&i) => Ok(()),
                    Ok(i) => fail(format!("{i} is outside {lo}..={hi}")),
                    Err(_) => fail(format!("'{s}' is not an integer")),
                }
            }
            (_, FieldValue::String(s)) => self.check_str(s).map_err(|r| CoreError::validation(path, r)),
            _ => Ok(()),
        }
    }

    fn check_str(&self, s: &str) -> Result<(), String> {
        let ok = match self {
            Self::NotWhitespace => !s.trim().is_empty(),
            Self::Numeric => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
            Self::Decimal => s.parse::<f64>().is_ok_and(f64::is_finite),
            Self::OneOf(tokens) => tokens.contains(&s),
            Self::IpAddress => s.parse::<IpAddr>().is_ok(),
            Self::HttpUrl => url::Url::parse(s)
                .is_ok_and(|u| matches!(u.scheme(), "http" | "https")),
            Self::IntRange(..) => true,
        };
        if ok {
            return Ok(());
        }
        Err(match self {
            Self::NotWhitespace => "must not be empty or whitespace".into(),
            Self::Numeric => format!("'{s}' is not a numeric identifier"),
            Self::Decimal => format!("'{s}' is not a decimal number"),
            Self::OneOf(tokens) => format!("'{s}' is not one of: {}", tokens.join(", ")),
            Self::IpAddress => format!("'{s}' is not an IP address"),
            Self::HttpUrl => format!("'{s}' is not an http(s) URL"),
            Self::IntRange(..) => String::new(),
        })
    }
}

// ── Descriptors ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<FieldValue>,
    pub validator: Option<Validator>,
    pub description: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            optional: true,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            validator: None,
            description: String::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    pub fn list(name: impl Into<String>, element: Element) -> Self {
        Self::new(name, FieldKind::List(element))
    }

    pub fn set(name: impl Into<String>, element: Element) -> Self {
        Self::new(name, FieldKind::Set(element))
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Map)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Computed, with no default. Reads fill it in; a value already present
    /// in configuration passes validation and is sent back as the remote
    /// identifier of the block it sits in.
    pub fn read_only(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.default = None;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Effective value: configured (normalized), else default, else zero.
    pub fn resolve(&self, configured: Option<&FieldValue>) -> FieldValue {
        match configured {
            Some(value) if *value != FieldValue::Null => self.kind.normalize(value),
            _ => self
                .default
                .clone()
                .unwrap_or_else(|| self.kind.zero()),
        }
    }

    /// Canonical form of a value about to be stored.
    pub fn normalize(&self, value: &FieldValue) -> FieldValue {
        self.kind.normalize(value)
    }

    fn check(&self, path: &str, configured: Option<&FieldValue>) -> Result<(), CoreError> {
        let value = match configured {
            None | Some(FieldValue::Null) => {
                if self.required && self.default.is_none() {
                    return Err(CoreError::validation(path, "required field is missing"));
                }
                return Ok(());
            }
            Some(value) => value,
        };
        let scalar = matches!(self.kind, FieldKind::Bool | FieldKind::Int);
        if value.is_zero() && !scalar {
            if self.required {
                return Err(CoreError::validation(path, "required field is empty"));
            }
            if matches!((&self.kind, value), (FieldKind::String, FieldValue::String(_))) {
                return Ok(());
            }
        }
        self.kind.check(path, value, self.validator.as_ref())
    }
}

// ── Descriptor sets ─────────────────────────────────────────────────

/// Named descriptors, one per field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl FieldSet {
    pub fn new(fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        Self {
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy with `descriptor` added, replacing any field of the same name.
    pub fn with(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Copy without the named field.
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Resolve every field of a nested block against this set.
    ///
    /// Keys the set does not declare are kept so validation can reject them.
    pub fn fill(&self, block: &Block) -> Block {
        let mut filled = block.clone();
        for (name, desc) in &self.fields {
            filled.insert(name.clone(), desc.resolve(block.get(name)));
        }
        filled
    }

    /// Check configured values before any remote call.
    pub fn validate(&self, state: &dyn StateStore) -> Result<(), CoreError> {
        for name in state.configured_fields() {
            if !self.contains(&name) {
                return Err(CoreError::UnknownField { field: name });
            }
        }
        self.fields
            .iter()
            .try_for_each(|(name, desc)| desc.check(name, state.configured(name)))
    }

    fn validate_block(&self, path: &str, block: &Block) -> Result<(), CoreError> {
        if let Some(key) = block.keys().find(|k| !self.contains(k)) {
            return Err(CoreError::UnknownField {
                field: format!("{path}.{key}"),
            });
        }
        self.fields
            .iter()
            .try_for_each(|(name, desc)| desc.check(&format!("{path}.{name}"), block.get(name)))
    }
}

// ── Composition ─────────────────────────────────────────────────────

/// Ordered merge; the last fragment defining a name wins entirely.
pub fn compose(fragments: &[&FieldSet]) -> FieldSet {
    let mut fields = BTreeMap::new();
    for fragment in fragments {
        for (name, desc) in &fragment.fields {
            fields.insert(name.clone(), desc.clone());
        }
    }
    FieldSet { fields }
}

/// Field flags of a writable resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceShape {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

/// Field flags of a read-only lookup.
#[derive(Debug, Clone, Copy)]
pub struct LookupShape {
    /// Fields usable as filters; optional and computed.
    pub lookup: &'static [&'static str],
    /// Identity field injected for lookup by id.
    pub identity: Option<&'static str>,
}

/// Mark fields required/optional for the writable resource variant.
pub fn as_resource_schema(set: &FieldSet, shape: &ResourceShape) -> FieldSet {
    let mut out = set.clone();
    for desc in out.fields.values_mut() {
        if shape.required.contains(&desc.name.as_str()) {
            desc.required = true;
            desc.optional = false;
            desc.computed = false;
        } else if shape.optional.contains(&desc.name.as_str()) {
            desc.required = false;
            desc.optional = true;
        }
    }
    out
}

/// Mark every field computed, keep filter fields settable, and inject the
/// lookup identity field.
pub fn as_data_source_schema(set: &FieldSet, shape: &LookupShape) -> FieldSet {
    let mut out = set.clone();
    for desc in out.fields.values_mut() {
        let lookup = shape.lookup.contains(&desc.name.as_str());
        desc.required = false;
        desc.optional = lookup;
        desc.computed = true;
        desc.force_new = false;
        desc.default = None;
        if !lookup {
            desc.validator = None;
        }
    }
    match shape.identity {
        Some(identity) => out.with(
            FieldDescriptor::string(identity)
                .optional()
                .computed()
                .validate(Validator::Numeric)
                .describe("Identifier of the matched object"),
        ),
        None => out,
    }
}
