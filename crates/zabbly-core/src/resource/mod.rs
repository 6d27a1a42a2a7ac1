// ── Resource definitions ──
//
// A resource pairs one wire type with its schema, endpoint and variant
// hook. The wire type's `Entity` impl fills the fields every variant of it
// shares; the hook then fills what is unique to the variant.

pub mod check;
pub mod directory;
pub mod graph;
pub mod host;
pub mod item;
pub mod lld;
pub mod template;
pub mod trigger;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;
use zabbly_api::Endpoint;

use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::FieldSet;
use crate::state::{ResourceData, StateStore};

/// A remote object type the engine can build, flatten and reconcile.
pub trait Entity: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Build the shared fields from declarative state.
    fn build(state: &dyn StateStore, gate: &VersionGate) -> Result<Self, CoreError>;

    /// Write the shared fields back into declarative state.
    fn flatten(&self, state: &mut dyn StateStore, gate: &VersionGate) -> Result<(), CoreError>;

    /// Add the explicit removals an update needs (template unlinks,
    /// cleared collections). Only called on update.
    fn apply_clears(&mut self, _state: &dyn StateStore) -> Result<(), CoreError> {
        Ok(())
    }
}

pub type WriteFn<W> = fn(&dyn StateStore, &VersionGate, &mut W) -> Result<(), CoreError>;
pub type ReadFn<W> = fn(&mut dyn StateStore, &VersionGate, &W) -> Result<(), CoreError>;

/// Variant-specific behaviour: one function for each direction.
pub struct Hook<W> {
    pub on_write: WriteFn<W>,
    pub on_read: ReadFn<W>,
}

impl<W> Hook<W> {
    pub const fn new(on_write: WriteFn<W>, on_read: ReadFn<W>) -> Self {
        Self { on_write, on_read }
    }

    /// Hook of a resource without variants.
    pub fn none() -> Self {
        Self {
            on_write: |_, _, _| Ok(()),
            on_read: |_, _, _| Ok(()),
        }
    }
}

impl<W> Clone for Hook<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Hook<W> {}

impl<W> fmt::Debug for Hook<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

// ── Writable resources ──────────────────────────────────────────────

/// A writable resource type: `zabbix_item_snmp`, `zabbix_host`...
pub struct ResourceDef<W> {
    pub name: &'static str,
    pub endpoint: &'static Endpoint,
    pub schema: Arc<FieldSet>,
    pub hook: Hook<W>,
}

impl<W: Entity> ResourceDef<W> {
    pub fn new(
        name: &'static str,
        endpoint: &'static Endpoint,
        schema: FieldSet,
        hook: Hook<W>,
    ) -> Self {
        Self {
            name,
            endpoint,
            schema: Arc::new(schema),
            hook,
        }
    }

    /// Fresh in-memory state for one instance.
    pub fn state(&self) -> ResourceData {
        ResourceData::new(Arc::clone(&self.schema))
    }

    /// Shared fields first, then the variant hook.
    pub fn build(&self, state: &dyn StateStore, gate: &VersionGate) -> Result<W, CoreError> {
        let mut object = W::build(state, gate)?;
        (self.hook.on_write)(state, gate, &mut object)?;
        trace!(resource = self.name, ?object, "built wire object");
        Ok(object)
    }

    pub fn flatten(
        &self,
        object: &W,
        state: &mut dyn StateStore,
        gate: &VersionGate,
    ) -> Result<(), CoreError> {
        object.flatten(state, gate)?;
        (self.hook.on_read)(state, gate, object)
    }
}

impl<W> fmt::Debug for ResourceDef<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDef")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.object)
            .field("fields", &self.schema.len())
            .finish()
    }
}

// ── Lookups ─────────────────────────────────────────────────────────

/// A read-only lookup of an existing object by exact-match filter.
pub struct LookupDef<W> {
    pub name: &'static str,
    pub endpoint: &'static Endpoint,
    pub schema: Arc<FieldSet>,
    /// Declarative fields sent as the filter, named as on the wire.
    pub filters: &'static [&'static str],
    /// Field receiving the matched object's identifier.
    pub id_field: Option<&'static str>,
    _entity: std::marker::PhantomData<fn() -> W>,
}

impl<W: Entity> LookupDef<W> {
    pub fn new(
        name: &'static str,
        endpoint: &'static Endpoint,
        schema: FieldSet,
        filters: &'static [&'static str],
        id_field: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            endpoint,
            schema: Arc::new(schema),
            filters,
            id_field,
            _entity: std::marker::PhantomData,
        }
    }

    pub fn state(&self) -> ResourceData {
        ResourceData::new(Arc::clone(&self.schema))
    }
}

impl<W> fmt::Debug for LookupDef<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupDef")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.object)
            .field("filters", &self.filters)
            .finish()
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Set a string field from a wire value.
pub(crate) fn put(state: &mut dyn StateStore, field: &str, value: &str) -> Result<(), CoreError> {
    state.set(field, value.into())
}

/// Remote identifiers that read back as `"0"` when unset.
pub(crate) fn unset_zero(id: &str) -> &str {
    if id == "0" { "" } else { id }
}
