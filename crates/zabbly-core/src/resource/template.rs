// ── Templates ──

use std::sync::LazyLock;

use zabbly_api::models::Template;

use crate::collection::{build_macros, flatten_macros, id_set};
use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::host::{flatten_links, group_ids, link_clears, tag_payload, template_ids};
use super::{Entity, put};

pub static TEMPLATE: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("host")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("Technical template name"),
        FieldDescriptor::string("name").computed(),
        FieldDescriptor::string("description"),
    ])
});

impl Entity for Template {
    fn id(&self) -> &str {
        &self.templateid
    }

    fn set_id(&mut self, id: String) {
        self.templateid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        Ok(Self {
            templateid: state.id().to_owned(),
            host: state.get_str("host"),
            name: state.get_str("name"),
            description: state.get_str("description"),
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
        put(state, "description", &self.description)?;
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
