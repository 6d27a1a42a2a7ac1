// ── RPC seam ──
//
// The engine never speaks a wire protocol itself. Anything able to send a
// named JSON-RPC method with a parameter bag and hand back the decoded
// `result` member can drive it: an HTTP client, a recorded fixture, or a
// scripted test double.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;

/// Request/response interface to the remote management API.
///
/// `params` is the JSON-RPC parameter bag (objects for `*.get`, `*.create`
/// and `*.update`; an array of identifiers for `*.delete`). On success the
/// implementation returns the `result` member of the response; remote
/// error objects map to [`Error::Rpc`].
pub trait RpcClient: Send + Sync {
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, Error>> + Send;
}

impl<T: RpcClient> RpcClient for Arc<T> {
    fn call(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, Error>> + Send {
        (**self).call(method, params)
    }
}
