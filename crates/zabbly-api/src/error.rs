use thiserror::Error;

/// Top-level error type for the `zabbly-api` crate.
///
/// Covers the failure modes of the RPC seam: errors reported by the
/// remote API, transport failures surfaced by an `RpcClient`
/// implementation, and payloads that could not be encoded or decoded.
/// `zabbly-core` wraps these without reinterpretation.
#[derive(Debug, Error)]
pub enum Error {
    // ── Remote API ──────────────────────────────────────────────────
    /// Structured error object returned by the JSON-RPC endpoint.
    #[error("API error {code}: {message} {data}")]
    Rpc {
        code: i64,
        message: String,
        data: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Failure reported by the `RpcClient` implementation itself
    /// (connection refused, TLS, timeouts...).
    #[error("RPC transport error: {0}")]
    Transport(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A request payload could not be encoded as JSON.
    #[error("Failed to encode request: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The call succeeded but the result does not have the expected shape.
    #[error("Unexpected response from {method}: {reason}")]
    UnexpectedResponse { method: String, reason: String },

    // ── Version ─────────────────────────────────────────────────────
    /// The remote self-reported version string is not `major[.minor[.patch]]`.
    #[error("Invalid API version '{raw}': {reason}")]
    InvalidVersion { raw: String, reason: String },
}

impl Error {
    /// Returns `true` if this error was produced by the remote API rather
    /// than by the transport or local encoding.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Rpc { .. })
    }

    /// Extract the JSON-RPC error code, if available.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}
