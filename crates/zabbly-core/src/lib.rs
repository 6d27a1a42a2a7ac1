//! Declarative-state reconciliation engine for the Zabbix management API.
//!
//! Converts user-declared state into remote API calls and remote objects
//! back into state:
//!
//! - **[`Reconciler`]**: create/read/update/delete for writable resources
//!   and exact-match lookups for data sources, over any
//!   [`RpcClient`](zabbly_api::RpcClient).
//!
//! - **[`Registry`]**: every resource and data-source definition, composed
//!   once from shared schema fragments ([`schema`]) plus a per-variant
//!   [`Hook`](resource::Hook).
//!
//! - **[`VersionGate`]**: picks wire representations by the remote API
//!   version (SNMP item layout, interface SNMP details).
//!
//! - **Codecs and collections** ([`codec`], [`collection`], [`differ`]):
//!   friendly-token/wire-code tables, nested block conversion, and the
//!   removal sets that drive template unlinks on update.

pub mod codec;
pub mod collection;
pub mod differ;
pub mod error;
pub mod gate;
pub mod reconciler;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod state;
pub mod value;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::EnumCodec;
pub use error::CoreError;
pub use gate::VersionGate;
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use registry::Registry;
pub use resource::{Entity, LookupDef, ResourceDef};
pub use schema::{FieldDescriptor, FieldKind, FieldSet};
pub use state::{ResourceData, StateStore};
pub use value::{Block, FieldValue};
