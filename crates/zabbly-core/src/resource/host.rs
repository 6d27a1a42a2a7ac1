// ── Hosts ──
//
// Also holds the pieces hosts share with templates: group and template
// links, macros and tags, and the explicit clears an update needs for
// unlinked templates and emptied tag sets.

use std::sync::LazyLock;

use zabbly_api::models::{GroupId, Host, Tag, TemplateId};

use crate::collection::{
    INTERFACE_BLOCK, MACRO_BLOCK, TAG_BLOCK, build_interfaces, build_macros, build_tags, flag,
    flatten_ids, flatten_interfaces, flatten_macros, flatten_tags, id_set,
};
use crate::differ;
use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{Element, FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::{Entity, put};

/// Links, macros and tags common to hosts and templates.
pub static LINKS: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::set("groups", Element::String)
            .validate(Validator::Numeric)
            .describe("Host group IDs"),
        FieldDescriptor::set("templates", Element::String)
            .validate(Validator::Numeric)
            .describe("Linked template IDs"),
        FieldDescriptor::list("macro", Element::Block(MACRO_BLOCK.clone())),
        FieldDescriptor::set("tag", Element::Block(TAG_BLOCK.clone())),
    ])
});

pub static HOST: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("host")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("Technical host name"),
        FieldDescriptor::string("name")
            .computed()
            .describe("Visible name, defaults to the host name"),
        FieldDescriptor::string("proxyid")
            .default("0")
            .validate(Validator::Numeric)
            .describe("Monitoring proxy ID, 0 for none"),
        FieldDescriptor::bool("enabled").default(true),
        FieldDescriptor::list("interface", Element::Block(INTERFACE_BLOCK.clone())),
    ])
});

pub(crate) fn group_ids(state: &dyn StateStore) -> Vec<GroupId> {
    id_set(state, "groups")
        .into_iter()
        .map(|groupid| GroupId { groupid })
        .collect()
}

pub(crate) fn template_ids(ids: Vec<String>) -> Vec<TemplateId> {
    ids.into_iter()
        .map(|templateid| TemplateId { templateid })
        .collect()
}

/// Tags for a write: omitted when none are declared.
pub(crate) fn tag_payload(state: &dyn StateStore) -> Option<Vec<Tag>> {
    let tags = build_tags(state, "tag");
    (!tags.is_empty()).then_some(tags)
}

/// Template unlinks and tag clears for an update.
pub(crate) fn link_clears(
    state: &dyn StateStore,
    templates_clear: &mut Vec<TemplateId>,
    tags: &mut Option<Vec<Tag>>,
) {
    *templates_clear = template_ids(differ::diff(state, "templates").removed_strings());
    if tags.is_none() && differ::emptied(state, "tag") {
        *tags = Some(Vec::new());
    }
}

pub(crate) fn flatten_links(
    state: &mut dyn StateStore,
    groups: &[GroupId],
    templates: &[TemplateId],
    tags: Option<&[Tag]>,
) -> Result<(), CoreError> {
    state.set("groups", flatten_ids(groups.iter().map(|g| g.groupid.as_str())))?;
    state.set(
        "templates",
        flatten_ids(templates.iter().map(|t| t.templateid.as_str())),
    )?;
    state.set("tag", flatten_tags(tags.unwrap_or_default()))
}

impl Entity for Host {
    fn id(&self) -> &str {
        &self.hostid
    }

    fn set_id(&mut self, id: String) {
        self.hostid = id;
    }

    fn build(state: &dyn StateStore, gate: &VersionGate) -> Result<Self, CoreError> {
        Ok(Self {
            hostid: state.id().to_owned(),
            host: state.get_str("host"),
            name: state.get_str("name"),
            proxy_hostid: state.get_str("proxyid"),
            status: flag(!state.get_bool("enabled")),
            interfaces: build_interfaces(state, "interface", gate)?,
            groups: group_ids(state),
            templates: template_ids(id_set(state, "templates")),
            macros: build_macros(state, "macro"),
            tags: tag_payload(state),
            ..Self::default()
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "host", &self.host)?;
        put(state, "name", &self.name)?;
        put(state, "proxyid", &self.proxy_hostid)?;
        state.set("enabled", (self.status == "0").into())?;
        state.set("interface", flatten_interfaces(&self.interfaces)?)?;
        state.set("macro", flatten_macros(&self.macros))?;
        flatten_links(
            state,
            &self.groups,
            &self.parent_templates,
            self.tags.as_deref(),
        )
    }

    fn apply_clears(&mut self, state: &dyn StateStore) -> Result<(), CoreError> {
        link_clears(state, &mut self.templates_clear, &mut self.tags);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::compose;
    use crate::state::ResourceData;
    use crate::value::FieldValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<FieldSet> {
        Arc::new(compose(&[&*HOST, &*LINKS]))
    }

    fn applied() -> ResourceData {
        ResourceData::existing(
            schema(),
            "10105",
            [
                ("host", FieldValue::from("web01")),
                (
                    "interface",
                    FieldValue::List(vec![FieldValue::block([("ip", "10.0.0.5".into())])]),
                ),
                ("groups", FieldValue::string_set(["2"])),
                ("templates", FieldValue::string_set(["10001", "10002"])),
                (
                    "tag",
                    FieldValue::List(vec![FieldValue::block([("key", "env".into())])]),
                ),
            ],
        )
    }

    #[test]
    fn create_payload_omits_clears_and_empty_tags() {
        let state = ResourceData::new(schema())
            .with("host", "web01")
            .unwrap()
            .with(
                "interface",
                FieldValue::List(vec![FieldValue::block([("ip", "10.0.0.5".into())])]),
            )
            .unwrap()
            .with("groups", FieldValue::strings(["2"]))
            .unwrap();
        let host = Host::build(&state, &VersionGate::default()).unwrap();
        let payload = serde_json::to_value(&host).unwrap();
        assert!(payload.get("templates_clear").is_none());
        assert!(payload.get("tags").is_none());
        assert_eq!(payload["status"], json!("0"));
        assert_eq!(payload["proxy_hostid"], json!("0"));
    }

    #[test]
    fn unlinking_a_template_sends_it_in_the_clear_list() {
        let mut state = applied();
        state
            .set("templates", FieldValue::string_set(["10002"]))
            .unwrap();
        let mut host = Host::build(&state, &VersionGate::default()).unwrap();
        host.apply_clears(&state).unwrap();

        let payload = serde_json::to_value(&host).unwrap();
        assert_eq!(payload["templates"], json!([{"templateid": "10002"}]));
        assert_eq!(payload["templates_clear"], json!([{"templateid": "10001"}]));
        assert_eq!(payload["tags"], json!([{"tag": "env", "value": ""}]));
    }

    #[test]
    fn clearing_all_tags_sends_an_empty_array() {
        let mut state = applied();
        state.set("tag", FieldValue::List(Vec::new())).unwrap();
        let mut host = Host::build(&state, &VersionGate::default()).unwrap();
        host.apply_clears(&state).unwrap();

        let payload = serde_json::to_value(&host).unwrap();
        assert_eq!(payload["tags"], json!([]));
        assert!(payload.get("templates_clear").is_none());
    }

    #[test]
    fn flatten_reads_parent_templates_and_status() {
        let host = Host {
            hostid: "10105".into(),
            host: "web01".into(),
            name: "Web 01".into(),
            proxy_hostid: "0".into(),
            status: "1".into(),
            parent_templates: template_ids(vec!["10001".into()]),
            groups: vec![GroupId {
                groupid: "2".into(),
            }],
            ..Host::default()
        };
        let mut state = ResourceData::new(schema());
        host.flatten(&mut state, &VersionGate::default()).unwrap();
        assert!(!state.get_bool("enabled"));
        assert_eq!(state.get_str("name"), "Web 01");
        assert_eq!(state.get_strings("templates"), vec!["10001"]);
        assert_eq!(state.get("tag"), FieldValue::Set(Default::default()));
    }
}
