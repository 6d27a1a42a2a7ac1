// Typed request wrapper
//
// Layers Zabbix method conventions (`<object>.get/create/update/delete`,
// `<ids>` response envelopes) on top of any `RpcClient`, and owns the
// optional request queue used when the remote side must not see
// concurrent writes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::rpc::RpcClient;
use crate::version::ApiVersion;

/// Typed facade over an [`RpcClient`].
///
/// With `serialize_requests` enabled every call, from every task sharing
/// this value, is funnelled through one async mutex so the remote system
/// sees strictly one request at a time. This is queueing only: it gives no
/// isolation between separate calls.
pub struct ZabbixApi<R> {
    rpc: R,
    queue: Option<Mutex<()>>,
}

impl<R: RpcClient> ZabbixApi<R> {
    pub fn new(rpc: R, serialize_requests: bool) -> Self {
        Self {
            rpc,
            queue: serialize_requests.then(|| Mutex::new(())),
        }
    }

    /// The wrapped RPC implementation.
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn serializes_requests(&self) -> bool {
        self.queue.is_some()
    }

    // ── Raw call ─────────────────────────────────────────────────────

    /// Issue one RPC call, waiting for the request queue when enabled.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        let _turn = match &self.queue {
            Some(queue) => Some(queue.lock().await),
            None => None,
        };
        debug!(method, "rpc call");
        trace!(%params, "rpc params");
        let result = self.rpc.call(method, params).await;
        if let Err(ref e) = result {
            debug!(method, error = %e, "rpc call failed");
        }
        result
    }

    // ── Object helpers ───────────────────────────────────────────────

    /// `<object>.get`, decoded into wire objects.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        params: Value,
    ) -> Result<Vec<T>, Error> {
        let method = endpoint.method("get");
        let result = self.call(&method, params).await?;
        serde_json::from_value(result.clone()).map_err(|e| Error::Deserialization {
            message: format!("{method}: {e}"),
            body: result.to_string(),
        })
    }

    /// `<object>.create`, returning the identifiers assigned by the remote.
    pub async fn create<T: Serialize>(
        &self,
        endpoint: &Endpoint,
        objects: &[T],
    ) -> Result<Vec<String>, Error> {
        let method = endpoint.method("create");
        let result = self.call(&method, serde_json::to_value(objects)?).await?;
        extract_ids(&method, endpoint.ids, &result)
    }

    /// `<object>.update`, returning the identifiers the remote touched.
    pub async fn update<T: Serialize>(
        &self,
        endpoint: &Endpoint,
        objects: &[T],
    ) -> Result<Vec<String>, Error> {
        let method = endpoint.method("update");
        let result = self.call(&method, serde_json::to_value(objects)?).await?;
        extract_ids(&method, endpoint.ids, &result)
    }

    /// `<object>.delete` by identifier.
    pub async fn delete(&self, endpoint: &Endpoint, ids: &[String]) -> Result<Vec<String>, Error> {
        let method = endpoint.method("delete");
        let result = self.call(&method, json!(ids)).await?;
        extract_ids(&method, endpoint.ids, &result)
    }

    /// `apiinfo.version`: the remote's self-reported version string.
    pub async fn version(&self) -> Result<ApiVersion, Error> {
        let result = self.call("apiinfo.version", json!({})).await?;
        match result.as_str() {
            Some(raw) => ApiVersion::parse(raw),
            None => Err(Error::UnexpectedResponse {
                method: "apiinfo.version".into(),
                reason: format!("expected a version string, got {result}"),
            }),
        }
    }
}

/// Pull `{"<ids>": ["1", "2"]}` out of a create/update/delete result.
///
/// Some server versions return numeric identifiers; both are accepted.
fn extract_ids(method: &str, key: &str, result: &Value) -> Result<Vec<String>, Error> {
    let unexpected = |reason: String| Error::UnexpectedResponse {
        method: method.to_owned(),
        reason,
    };

    let ids = result
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| unexpected(format!("missing '{key}' array in {result}")))?;

    ids.iter()
        .map(|id| match id {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(unexpected(format!("identifier {other} is not a string"))),
        })
        .collect()
}
