// ── Core error types ──
//
// Everything the engine can fail with. Remote and transport failures are
// carried through untouched in `Api`: the reconciler never retries,
// downgrades or reinterprets them.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation errors ────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("'{value}' is not a valid {codec}")]
    InvalidEnum { codec: &'static str, value: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("{field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    // ── Cardinality errors ───────────────────────────────────────────
    #[error("multiple {entity} objects found for id {id}")]
    MultipleFound { entity: &'static str, id: String },

    #[error("no {entity} found matching filter {filter}")]
    NoMatch { entity: &'static str, filter: String },

    #[error("multiple {entity} objects found matching filter {filter}, please refine")]
    AmbiguousMatch { entity: &'static str, filter: String },

    // ── API errors (propagated verbatim) ─────────────────────────────
    #[error(transparent)]
    Api(#[from] zabbly_api::Error),
}

impl CoreError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised before any RPC call was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidEnum { .. }
                | Self::UnknownField { .. }
                | Self::TypeMismatch { .. }
        )
    }

    /// Returns `true` for result-count violations on reads.
    pub fn is_cardinality(&self) -> bool {
        matches!(
            self,
            Self::MultipleFound { .. } | Self::NoMatch { .. } | Self::AmbiguousMatch { .. }
        )
    }
}
