// ── Items & item prototypes ──

use std::sync::LazyLock;

use zabbly_api::models::{Item, LldRule};

use crate::codec::VALUE_TYPES;
use crate::collection::{
    PREPROCESSOR_BLOCK, build_preprocessors, flatten_ids, flatten_preprocessors, id_set,
};
use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{Element, FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::check::{
    self, AGENT, CALCULATED, DELAY, DEPENDENT, HTTP, INTERFACE, SNMP, read_plain,
};
use super::{Entity, Hook, put};

pub static ITEM_COMMON: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("hostid")
            .required()
            .force_new()
            .validate(Validator::Numeric)
            .describe("Host ID"),
        FieldDescriptor::string("key")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("Item key"),
        FieldDescriptor::string("name")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("valuetype")
            .required()
            .validate(VALUE_TYPES.validator())
            .describe(VALUE_TYPES.describe("Value type")),
        FieldDescriptor::list("preprocessor", Element::Block(PREPROCESSOR_BLOCK.clone())),
        FieldDescriptor::set("applications", Element::String)
            .validate(Validator::Numeric)
            .describe("Application IDs"),
    ])
});

pub static PROTOTYPE: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("ruleid")
        .required()
        .force_new()
        .validate(Validator::Numeric)
        .describe("Parent discovery rule ID")])
});

impl Entity for Item {
    fn id(&self) -> &str {
        &self.itemid
    }

    fn set_id(&mut self, id: String) {
        self.itemid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        let ruleid = if state.declares("ruleid") {
            state.get_str("ruleid")
        } else {
            String::new()
        };
        Ok(Self {
            itemid: state.id().to_owned(),
            hostid: state.get_str("hostid"),
            key: state.get_str("key"),
            name: state.get_str("name"),
            value_type: VALUE_TYPES.decode(&state.get_str("valuetype"))?.to_owned(),
            preprocessing: build_preprocessors(state, "preprocessor"),
            applications: id_set(state, "applications"),
            ruleid,
            ..Self::default()
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "hostid", &self.hostid)?;
        put(state, "key", &self.key)?;
        put(state, "name", &self.name)?;
        put(state, "valuetype", VALUE_TYPES.encode(&self.value_type)?)?;

        let prior = state.get_blocks("preprocessor");
        state.set("preprocessor", flatten_preprocessors(&self.preprocessing, &prior))?;
        state.set(
            "applications",
            flatten_ids(self.applications.iter().map(String::as_str)),
        )?;

        if state.declares("ruleid") {
            if let Some(rule) = &self.discovery_rule {
                put(state, "ruleid", &rule.itemid)?;
            }
        }
        Ok(())
    }
}

// ── Variant table ───────────────────────────────────────────────────

/// One way of collecting a value, available as item, item prototype and
/// (when `lld` is set) discovery rule.
pub struct Variant {
    pub item: &'static str,
    pub prototype: &'static str,
    pub fragments: &'static [&'static LazyLock<FieldSet>],
    pub item_hook: Hook<Item>,
    pub lld: Option<(&'static str, Hook<LldRule>)>,
}

pub static VARIANTS: [Variant; 11] = [
    Variant {
        item: "zabbix_item_agent",
        prototype: "zabbix_proto_item_agent",
        fragments: &[&DELAY, &INTERFACE, &AGENT],
        item_hook: Hook::new(check::write_agent::<Item>, check::read_agent::<Item>),
        lld: Some((
            "zabbix_lld_agent",
            Hook::new(check::write_agent::<LldRule>, check::read_agent::<LldRule>),
        )),
    },
    Variant {
        item: "zabbix_item_simple",
        prototype: "zabbix_proto_item_simple",
        fragments: &[&DELAY, &INTERFACE],
        item_hook: Hook::new(check::write_simple::<Item>, read_plain::<Item>),
        lld: Some((
            "zabbix_lld_simple",
            Hook::new(check::write_simple::<LldRule>, read_plain::<LldRule>),
        )),
    },
    Variant {
        item: "zabbix_item_internal",
        prototype: "zabbix_proto_item_internal",
        fragments: &[&DELAY, &INTERFACE],
        item_hook: Hook::new(check::write_internal::<Item>, read_plain::<Item>),
        lld: Some((
            "zabbix_lld_internal",
            Hook::new(check::write_internal::<LldRule>, read_plain::<LldRule>),
        )),
    },
    Variant {
        item: "zabbix_item_external",
        prototype: "zabbix_proto_item_external",
        fragments: &[&DELAY, &INTERFACE],
        item_hook: Hook::new(check::write_external::<Item>, read_plain::<Item>),
        lld: Some((
            "zabbix_lld_external",
            Hook::new(check::write_external::<LldRule>, read_plain::<LldRule>),
        )),
    },
    Variant {
        item: "zabbix_item_trapper",
        prototype: "zabbix_proto_item_trapper",
        fragments: &[],
        item_hook: Hook::new(check::write_trapper::<Item>, read_plain::<Item>),
        lld: Some((
            "zabbix_lld_trapper",
            Hook::new(check::write_trapper::<LldRule>, read_plain::<LldRule>),
        )),
    },
    Variant {
        item: "zabbix_item_snmptrap",
        prototype: "zabbix_proto_item_snmptrap",
        fragments: &[],
        item_hook: Hook::new(check::write_snmptrap::<Item>, read_plain::<Item>),
        lld: None,
    },
    Variant {
        item: "zabbix_item_aggregate",
        prototype: "zabbix_proto_item_aggregate",
        fragments: &[&DELAY],
        item_hook: Hook::new(check::write_aggregate::<Item>, read_plain::<Item>),
        lld: None,
    },
    Variant {
        item: "zabbix_item_calculated",
        prototype: "zabbix_proto_item_calculated",
        fragments: &[&DELAY, &CALCULATED],
        item_hook: Hook::new(
            check::write_calculated::<Item>,
            check::read_calculated::<Item>,
        ),
        lld: None,
    },
    Variant {
        item: "zabbix_item_dependent",
        prototype: "zabbix_proto_item_dependent",
        fragments: &[&DEPENDENT],
        item_hook: Hook::new(check::write_dependent::<Item>, check::read_dependent::<Item>),
        lld: Some((
            "zabbix_lld_dependent",
            Hook::new(
                check::write_dependent::<LldRule>,
                check::read_dependent::<LldRule>,
            ),
        )),
    },
    Variant {
        item: "zabbix_item_snmp",
        prototype: "zabbix_proto_item_snmp",
        fragments: &[&DELAY, &INTERFACE, &SNMP],
        item_hook: Hook::new(check::write_snmp::<Item>, check::read_snmp::<Item>),
        lld: Some((
            "zabbix_lld_snmp",
            Hook::new(check::write_snmp::<LldRule>, check::read_snmp::<LldRule>),
        )),
    },
    Variant {
        item: "zabbix_item_http",
        prototype: "zabbix_proto_item_http",
        fragments: &[&DELAY, &INTERFACE, &HTTP],
        item_hook: Hook::new(check::write_http::<Item>, check::read_http::<Item>),
        lld: Some((
            "zabbix_lld_http",
            Hook::new(check::write_http::<LldRule>, check::read_http::<LldRule>),
        )),
    },
];

impl Variant {
    /// Fragments as plain references, in declaration order.
    pub fn fragment_sets(&self) -> Vec<&'static FieldSet> {
        self.fragments.iter().map(|f| &***f).collect()
    }
}
