//! Wire layer for the Zabbix management API.
//!
//! This crate knows what the remote API's objects look like and how its
//! methods are named, but not how requests travel:
//!
//! - **[`RpcClient`]**: the single seam to the outside world. Any
//!   implementation that can send a named method with a JSON parameter bag
//!   and return the decoded result drives the rest of the workspace.
//!
//! - **[`ZabbixApi`]**: typed `get`/`create`/`update`/`delete` helpers on
//!   top of an `RpcClient`, including the optional serialize-requests
//!   queue.
//!
//! - **[`endpoint`]**: static descriptions of each object family
//!   (method prefix, identifier key, related-object selects).
//!
//! - **[`models`]**: serde wire objects (`Item`, `LldRule`, `Host`,
//!   `Template`, `Trigger`, `Graph`, `Application`, `HostGroup`, `Proxy`)
//!   and their nested arrays.
//!
//! - **[`ApiVersion`]**: the remote's self-reported version in packed
//!   integer form.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod rpc;
pub mod version;

pub use client::ZabbixApi;
pub use endpoint::Endpoint;
pub use error::Error;
pub use rpc::RpcClient;
pub use version::ApiVersion;
