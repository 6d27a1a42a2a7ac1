// ── Resource registry ──
//
// Every resource and lookup definition, composed once from the schema
// fragments and shared read-only afterwards.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use zabbly_api::endpoint;
use zabbly_api::models::{Application, Graph, Host, HostGroup, Item, LldRule, Proxy, Template, Trigger};

use crate::resource::directory::{APPLICATION, HOST_GROUP, PROXY};
use crate::resource::graph::GRAPH;
use crate::resource::host::{HOST, LINKS};
use crate::resource::item::{ITEM_COMMON, PROTOTYPE, VARIANTS};
use crate::resource::lld::LLD_COMMON;
use crate::resource::template::TEMPLATE;
use crate::resource::trigger::TRIGGER;
use crate::resource::{Hook, LookupDef, ResourceDef};
use crate::schema::{
    FieldSet, LookupShape, ResourceShape, as_data_source_schema, as_resource_schema, compose,
};

const NO_SHAPE: ResourceShape = ResourceShape {
    required: &[],
    optional: &[],
};

#[derive(Debug)]
pub struct Registry {
    /// Items and item prototypes, by resource name.
    pub items: BTreeMap<&'static str, ResourceDef<Item>>,
    pub lld_rules: BTreeMap<&'static str, ResourceDef<LldRule>>,
    pub host: ResourceDef<Host>,
    pub template: ResourceDef<Template>,
    pub trigger: ResourceDef<Trigger>,
    pub graph: ResourceDef<Graph>,
    pub graph_prototype: ResourceDef<Graph>,
    pub application: ResourceDef<Application>,
    pub host_group: ResourceDef<HostGroup>,

    pub host_lookup: LookupDef<Host>,
    pub template_lookup: LookupDef<Template>,
    pub host_group_lookup: LookupDef<HostGroup>,
    pub application_lookup: LookupDef<Application>,
    pub proxy_lookup: LookupDef<Proxy>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::build);

impl Registry {
    /// The process-wide registry.
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    fn build() -> Self {
        let mut items = BTreeMap::new();
        let mut lld_rules = BTreeMap::new();

        for variant in &VARIANTS {
            let fragments = variant.fragment_sets();

            let mut item = vec![&*ITEM_COMMON];
            item.extend(&fragments);
            items.insert(
                variant.item,
                ResourceDef::new(variant.item, &endpoint::ITEM, compose(&item), variant.item_hook),
            );

            let mut prototype = vec![&*ITEM_COMMON, &*PROTOTYPE];
            prototype.extend(&fragments);
            items.insert(
                variant.prototype,
                ResourceDef::new(
                    variant.prototype,
                    &endpoint::ITEM_PROTOTYPE,
                    compose(&prototype),
                    variant.item_hook,
                ),
            );

            if let Some((name, hook)) = variant.lld {
                let mut rule = fragments.clone();
                rule.push(&LLD_COMMON);
                lld_rules.insert(
                    name,
                    ResourceDef::new(name, &endpoint::DISCOVERY_RULE, compose(&rule), hook),
                );
            }
        }

        let host = as_resource_schema(
            &compose(&[&*HOST, &*LINKS]),
            &ResourceShape {
                required: &["groups", "interface"],
                optional: &[],
            },
        );
        let template = as_resource_schema(
            &compose(&[&*TEMPLATE, &*LINKS]),
            &ResourceShape {
                required: &["groups"],
                optional: &[],
            },
        );
        let graph = as_resource_schema(&GRAPH, &NO_SHAPE);

        Self {
            items,
            lld_rules,
            host_lookup: LookupDef::new(
                "zabbix_host",
                &endpoint::HOST,
                as_data_source_schema(
                    &host,
                    &LookupShape {
                        lookup: &["host", "name"],
                        identity: Some("hostid"),
                    },
                ),
                &["host", "hostid", "name"],
                Some("hostid"),
            ),
            template_lookup: LookupDef::new(
                "zabbix_template",
                &endpoint::TEMPLATE,
                as_data_source_schema(
                    &template,
                    &LookupShape {
                        lookup: &["host", "name"],
                        identity: Some("templateid"),
                    },
                ),
                &["host", "name"],
                Some("templateid"),
            ),
            host_group_lookup: LookupDef::new(
                "zabbix_hostgroup",
                &endpoint::HOST_GROUP,
                as_data_source_schema(
                    &HOST_GROUP,
                    &LookupShape {
                        lookup: &["name"],
                        identity: Some("groupid"),
                    },
                ),
                &["name"],
                Some("groupid"),
            ),
            application_lookup: LookupDef::new(
                "zabbix_application",
                &endpoint::APPLICATION,
                as_data_source_schema(
                    &APPLICATION,
                    &LookupShape {
                        lookup: &["name", "hostid"],
                        identity: Some("applicationid"),
                    },
                ),
                &["name", "hostid"],
                Some("applicationid"),
            ),
            proxy_lookup: LookupDef::new(
                "zabbix_proxy",
                &endpoint::PROXY,
                as_data_source_schema(
                    &PROXY,
                    &LookupShape {
                        lookup: &["host"],
                        identity: Some("proxyid"),
                    },
                ),
                &["host"],
                Some("proxyid"),
            ),
            host: ResourceDef::new("zabbix_host", &endpoint::HOST, host, Hook::none()),
            template: ResourceDef::new(
                "zabbix_template",
                &endpoint::TEMPLATE,
                template,
                Hook::none(),
            ),
            trigger: ResourceDef::new(
                "zabbix_trigger",
                &endpoint::TRIGGER,
                TRIGGER.clone(),
                Hook::none(),
            ),
            graph_prototype: ResourceDef::new(
                "zabbix_proto_graph",
                &endpoint::GRAPH_PROTOTYPE,
                graph.clone(),
                Hook::none(),
            ),
            graph: ResourceDef::new("zabbix_graph", &endpoint::GRAPH, graph, Hook::none()),
            application: ResourceDef::new(
                "zabbix_application",
                &endpoint::APPLICATION,
                APPLICATION.clone(),
                Hook::none(),
            ),
            host_group: ResourceDef::new(
                "zabbix_hostgroup",
                &endpoint::HOST_GROUP,
                HOST_GROUP.clone(),
                Hook::none(),
            ),
        }
    }

    pub fn item(&self, name: &str) -> Option<&ResourceDef<Item>> {
        self.items.get(name)
    }

    pub fn lld_rule(&self, name: &str) -> Option<&ResourceDef<LldRule>> {
        self.lld_rules.get(name)
    }

    /// Every writable resource name with its schema.
    pub fn resources(&self) -> BTreeMap<&'static str, Arc<FieldSet>> {
        let mut out: BTreeMap<_, _> = self
            .items
            .values()
            .map(|d| (d.name, Arc::clone(&d.schema)))
            .chain(self.lld_rules.values().map(|d| (d.name, Arc::clone(&d.schema))))
            .collect();
        for (name, schema) in [
            (self.host.name, &self.host.schema),
            (self.template.name, &self.template.schema),
            (self.trigger.name, &self.trigger.schema),
            (self.graph.name, &self.graph.schema),
            (self.graph_prototype.name, &self.graph_prototype.schema),
            (self.application.name, &self.application.schema),
            (self.host_group.name, &self.host_group.schema),
        ] {
            out.insert(name, Arc::clone(schema));
        }
        out
    }

    /// Every lookup name with its schema.
    pub fn data_sources(&self) -> BTreeMap<&'static str, Arc<FieldSet>> {
        [
            (self.host_lookup.name, &self.host_lookup.schema),
            (self.template_lookup.name, &self.template_lookup.schema),
            (self.host_group_lookup.name, &self.host_group_lookup.schema),
            (self.application_lookup.name, &self.application_lookup.schema),
            (self.proxy_lookup.name, &self.proxy_lookup.schema),
        ]
        .into_iter()
        .map(|(name, schema)| (name, Arc::clone(schema)))
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    #[test]
    fn catalogue_is_complete() {
        let registry = Registry::global();
        assert_eq!(registry.items.len(), 22);
        assert_eq!(registry.lld_rules.len(), 8);
        assert_eq!(registry.resources().len(), 22 + 8 + 7);
        assert_eq!(registry.data_sources().len(), 5);
        assert!(registry.item("zabbix_proto_item_snmp").is_some());
        assert!(registry.lld_rule("zabbix_lld_calculated").is_none());
    }

    #[test]
    fn discovery_rules_keep_their_own_delay() {
        let registry = Registry::global();
        let rule = registry.lld_rule("zabbix_lld_snmp").unwrap();
        let delay = rule.schema.get("delay").unwrap();
        assert_eq!(delay.default, Some(FieldValue::from("3600")));
        assert!(rule.schema.contains("snmp_oid"));

        let item = registry.item("zabbix_item_snmp").unwrap();
        assert_eq!(
            item.schema.get("delay").unwrap().default,
            Some(FieldValue::from("1m"))
        );
        assert!(!item.schema.contains("ruleid"));
        assert!(registry.item("zabbix_proto_item_snmp").unwrap().schema.contains("ruleid"));
    }

    #[test]
    fn data_sources_are_read_only_except_filters() {
        let registry = Registry::global();
        let host = &registry.host_lookup.schema;
        assert!(host.iter().all(|d| d.computed && !d.required));
        assert!(host.get("host").unwrap().optional);
        assert!(!host.get("interface").unwrap().optional);
        assert!(host.contains("hostid"));
        assert!(registry.host.schema.get("groups").unwrap().required);
        assert!(!registry.host.schema.contains("hostid"));
    }

    #[test]
    fn repeated_lookups_share_one_registry() {
        assert!(std::ptr::eq(Registry::global(), Registry::global()));
    }
}
