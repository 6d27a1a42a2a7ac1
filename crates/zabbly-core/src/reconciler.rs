// ── Reconciler ──
//
// Drives create/read/update/delete for writable resources and filter
// lookups for data sources. Each operation issues its RPC calls strictly
// one after another; the only cross-operation coordination is the
// optional request queue inside `ZabbixApi`.

use std::slice;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};
use zabbly_api::{ApiVersion, RpcClient, ZabbixApi};

use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::resource::{Entity, LookupDef, ResourceDef};
use crate::state::StateStore;

/// Settings fixed for the lifetime of a `Reconciler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Remote API version every representation decision is made against.
    pub version: ApiVersion,
    /// Queue every RPC call behind a single lock.
    pub serialize_requests: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            version: ApiVersion::V5_0,
            serialize_requests: false,
        }
    }
}

struct Inner<R> {
    api: ZabbixApi<R>,
    gate: VersionGate,
}

/// Cheaply cloneable handle; clones share the request queue.
pub struct Reconciler<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for Reconciler<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RpcClient> Reconciler<R> {
    pub fn new(rpc: R, config: ReconcilerConfig) -> Self {
        debug!(
            version = %config.version,
            serialize_requests = config.serialize_requests,
            "reconciler ready"
        );
        Self {
            inner: Arc::new(Inner {
                api: ZabbixApi::new(rpc, config.serialize_requests),
                gate: VersionGate::new(config.version),
            }),
        }
    }

    /// Ask the remote for its version and build a reconciler for it.
    pub async fn negotiate(rpc: R, serialize_requests: bool) -> Result<Self, CoreError> {
        let api = ZabbixApi::new(rpc, serialize_requests);
        let version = api.version().await?;
        info!(%version, "negotiated API version");
        Ok(Self {
            inner: Arc::new(Inner {
                api,
                gate: VersionGate::new(version),
            }),
        })
    }

    pub fn gate(&self) -> &VersionGate {
        &self.inner.gate
    }

    pub fn api(&self) -> &ZabbixApi<R> {
        &self.inner.api
    }

    // ── Writable resources ───────────────────────────────────────────

    /// Validate, build and create, then read the object back so state
    /// reflects what the remote stored.
    pub async fn create<W: Entity>(
        &self,
        def: &ResourceDef<W>,
        state: &mut dyn StateStore,
    ) -> Result<(), CoreError> {
        def.schema.validate(state)?;
        let object = def.build(state, &self.inner.gate)?;

        let ids = self
            .inner
            .api
            .create(def.endpoint, slice::from_ref(&object))
            .await?;
        let id = match ids.as_slice() {
            [id] => id.clone(),
            other => {
                return Err(zabbly_api::Error::UnexpectedResponse {
                    method: def.endpoint.method("create"),
                    reason: format!("expected exactly one identifier, got {}", other.len()),
                }
                .into());
            }
        };

        debug!(resource = def.name, %id, "created");
        state.set_id(id);
        self.read(def, state).await
    }

    /// Refresh state from the remote. A vanished object clears the
    /// identity instead of failing.
    pub async fn read<W: Entity>(
        &self,
        def: &ResourceDef<W>,
        state: &mut dyn StateStore,
    ) -> Result<(), CoreError> {
        let id = state.id().to_owned();
        if id.is_empty() {
            debug!(resource = def.name, "no identity, nothing to read");
            return Ok(());
        }

        let mut objects: Vec<W> = self
            .inner
            .api
            .get(def.endpoint, def.endpoint.get_by_id(&id))
            .await?;
        match objects.len() {
            0 => {
                debug!(resource = def.name, %id, "object is gone");
                state.set_id(String::new());
                Ok(())
            }
            1 => {
                let object = objects.swap_remove(0);
                def.flatten(&object, state, &self.inner.gate)
            }
            _ => Err(CoreError::MultipleFound {
                entity: def.endpoint.object,
                id,
            }),
        }
    }

    pub async fn update<W: Entity>(
        &self,
        def: &ResourceDef<W>,
        state: &mut dyn StateStore,
    ) -> Result<(), CoreError> {
        def.schema.validate(state)?;
        let mut object = def.build(state, &self.inner.gate)?;
        object.set_id(state.id().to_owned());
        object.apply_clears(state)?;

        self.inner
            .api
            .update(def.endpoint, slice::from_ref(&object))
            .await?;
        debug!(resource = def.name, id = object.id(), "updated");
        self.read(def, state).await
    }

    pub async fn delete<W: Entity>(
        &self,
        def: &ResourceDef<W>,
        state: &mut dyn StateStore,
    ) -> Result<(), CoreError> {
        let id = state.id().to_owned();
        if id.is_empty() {
            return Ok(());
        }
        self.inner.api.delete(def.endpoint, &[id.clone()]).await?;
        debug!(resource = def.name, %id, "deleted");
        state.set_id(String::new());
        Ok(())
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Find exactly one object matching the configured filter fields.
    pub async fn lookup<W: Entity>(
        &self,
        def: &LookupDef<W>,
        state: &mut dyn StateStore,
    ) -> Result<(), CoreError> {
        def.schema.validate(state)?;

        let filter: Map<String, Value> = def
            .filters
            .iter()
            .filter_map(|field| {
                state
                    .configured(field)
                    .filter(|value| !value.is_zero())
                    .map(|value| ((*field).to_owned(), value.to_json()))
            })
            .collect();
        if filter.is_empty() {
            return Err(CoreError::validation(
                def.name,
                format!("set at least one of: {}", def.filters.join(", ")),
            ));
        }
        let shown = Value::Object(filter.clone()).to_string();

        let mut objects: Vec<W> = self
            .inner
            .api
            .get(def.endpoint, def.endpoint.get_by_filter(filter))
            .await?;
        match objects.len() {
            0 => Err(CoreError::NoMatch {
                entity: def.endpoint.object,
                filter: shown,
            }),
            1 => {
                let object = objects.swap_remove(0);
                debug!(lookup = def.name, id = object.id(), "lookup matched");
                state.set_id(object.id().to_owned());
                if let Some(field) = def.id_field {
                    state.set(field, object.id().into())?;
                }
                object.flatten(state, &self.inner.gate)
            }
            _ => Err(CoreError::AmbiguousMatch {
                entity: def.endpoint.object,
                filter: shown,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use zabbly_api::Error;

    /// Fails every call; operations under test must not reach it.
    struct Offline;

    impl RpcClient for Offline {
        async fn call(&self, method: &str, _params: Value) -> Result<Value, Error> {
            Err(Error::Transport(format!("unexpected call to {method}")))
        }
    }

    #[test]
    fn clones_share_one_gate_and_queue() {
        let reconciler = Reconciler::new(
            Offline,
            ReconcilerConfig {
                version: ApiVersion::new(4, 0, 0),
                serialize_requests: true,
            },
        );
        let clone = reconciler.clone();
        assert!(std::ptr::eq(reconciler.api(), clone.api()));
        assert_eq!(clone.gate().version(), ApiVersion::new(4, 0, 0));
        assert!(clone.api().serializes_requests());
    }

    #[test]
    fn delete_without_identity_makes_no_call() {
        let reconciler = Reconciler::new(Offline, ReconcilerConfig::default());
        let def = Registry::global().item("zabbix_item_trapper").unwrap();
        let mut state = def.state();
        tokio_test::block_on(reconciler.delete(def, &mut state)).unwrap();
        assert_eq!(state.id(), "");
    }

    #[test]
    fn transport_failures_surface_as_api_errors() {
        let reconciler = Reconciler::new(Offline, ReconcilerConfig::default());
        let def = &Registry::global().host_group;
        let mut state = def.state();
        state.set_id("5".into());
        let err = tokio_test::block_on(reconciler.read(def, &mut state)).unwrap_err();
        assert!(matches!(err, CoreError::Api(Error::Transport(_))));
        assert_eq!(state.id(), "5");
    }
}
