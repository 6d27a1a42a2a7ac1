#![allow(dead_code, clippy::unwrap_used)]
// Shared test double: a scripted `RpcClient` that records every call.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use zabbly_api::{ApiVersion, Error, RpcClient};
use zabbly_core::{Reconciler, ReconcilerConfig};

#[derive(Default)]
pub struct MockRpc {
    results: Mutex<HashMap<String, VecDeque<Result<Value, (i64, String)>>>>,
    calls: Mutex<Vec<(String, Value)>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call open for `delay` so overlapping calls are observable.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn ok(self, method: &str, result: Value) -> Self {
        self.push(method, Ok(result));
        self
    }

    pub fn err(self, method: &str, code: i64, message: &str) -> Self {
        self.push(method, Err((code, message.into())));
        self
    }

    fn push(&self, method: &str, result: Result<Value, (i64, String)>) {
        self.results
            .lock()
            .unwrap()
            .entry(method.into())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    /// Parameters of the first call to `method`.
    pub fn params(&self, method: &str) -> Value {
        self.calls()
            .into_iter()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params)
            .unwrap_or_else(|| panic!("{method} was never called"))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl RpcClient for MockRpc {
    async fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push((method.into(), params));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .results
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err((code, message))) => Err(Error::Rpc {
                code,
                message,
                data: String::new(),
            }),
            None => Err(Error::Transport(format!("no scripted result for {method}"))),
        }
    }
}

/// Reconciler over a shared mock, for a 5.0 server without request queueing.
pub fn reconciler(rpc: MockRpc) -> (Reconciler<Arc<MockRpc>>, Arc<MockRpc>) {
    reconciler_for(rpc, ApiVersion::V5_0, false)
}

pub fn reconciler_for(
    rpc: MockRpc,
    version: ApiVersion,
    serialize_requests: bool,
) -> (Reconciler<Arc<MockRpc>>, Arc<MockRpc>) {
    let rpc = Arc::new(rpc);
    let reconciler = Reconciler::new(
        Arc::clone(&rpc),
        ReconcilerConfig {
            version,
            serialize_requests,
        },
    );
    (reconciler, rpc)
}
