// ── Directory objects ──
//
// Host groups, applications and proxies: flat objects with a name and
// little else, mostly used as lookup targets.

use std::sync::LazyLock;

use zabbly_api::models::{Application, HostGroup, Proxy};

use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::{Entity, put};

pub static HOST_GROUP: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("name")
        .required()
        .validate(Validator::NotWhitespace)
        .describe("Host group name")])
});

pub static APPLICATION: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("name")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("hostid")
            .required()
            .force_new()
            .validate(Validator::Numeric),
    ])
});

pub static PROXY: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("host")
        .required()
        .validate(Validator::NotWhitespace)
        .describe("Proxy name")])
});

impl Entity for HostGroup {
    fn id(&self) -> &str {
        &self.groupid
    }

    fn set_id(&mut self, id: String) {
        self.groupid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        Ok(Self {
            groupid: state.id().to_owned(),
            name: state.get_str("name"),
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "name", &self.name)
    }
}

impl Entity for Application {
    fn id(&self) -> &str {
        &self.applicationid
    }

    fn set_id(&mut self, id: String) {
        self.applicationid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        Ok(Self {
            applicationid: state.id().to_owned(),
            name: state.get_str("name"),
            hostid: state.get_str("hostid"),
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "name", &self.name)?;
        put(state, "hostid", &self.hostid)
    }
}

impl Entity for Proxy {
    fn id(&self) -> &str {
        &self.proxyid
    }

    fn set_id(&mut self, id: String) {
        self.proxyid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        Ok(Self {
            proxyid: state.id().to_owned(),
            host: state.get_str("host"),
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "host", &self.host)
    }
}
