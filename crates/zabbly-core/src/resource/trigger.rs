// ── Triggers ──

use std::sync::LazyLock;

use zabbly_api::models::{Trigger, TriggerRef};

use crate::codec::TRIGGER_PRIORITIES;
use crate::collection::{TAG_BLOCK, flag, flatten_ids, flatten_tags, id_set, is_flag_set};
use crate::differ;
use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{Element, FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::host::tag_payload;
use super::{Entity, put};

const RECOVERY_EXPRESSION: &str = "1";
const RECOVERY_NONE: &str = "2";
const CORRELATION_TAG: &str = "1";

// Stand-ins for a mode the server reports as enabled without its value.
// They never match configuration, so the next apply resends both fields.
const MISSING_RECOVERY_EXPRESSION: &str = "<recovery_mode_enabled_no_expression>";
const MISSING_CORRELATION_TAG: &str = "<correlation_enabled_no_tag>";

pub static TRIGGER: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("name")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("Trigger name"),
        FieldDescriptor::string("expression")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("comments"),
        FieldDescriptor::string("priority")
            .default("not_classified")
            .validate(TRIGGER_PRIORITIES.validator())
            .describe(TRIGGER_PRIORITIES.describe("Severity")),
        FieldDescriptor::bool("enabled").default(true),
        FieldDescriptor::bool("multiple")
            .default(false)
            .describe("Generate a problem event on every evaluation"),
        FieldDescriptor::string("url").validate(Validator::HttpUrl),
        FieldDescriptor::bool("recovery_none").default(false),
        FieldDescriptor::string("recovery_expression")
            .describe("Ignored when recovery_none is set"),
        FieldDescriptor::string("correlation_tag"),
        FieldDescriptor::bool("manual_close").default(false),
        FieldDescriptor::set("dependencies", Element::String)
            .validate(Validator::Numeric)
            .describe("Trigger IDs this trigger depends on"),
        FieldDescriptor::set("tag", Element::Block(TAG_BLOCK.clone())),
    ])
});

impl Entity for Trigger {
    fn id(&self) -> &str {
        &self.triggerid
    }

    fn set_id(&mut self, id: String) {
        self.triggerid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        let mut trigger = Self {
            triggerid: state.id().to_owned(),
            description: state.get_str("name"),
            expression: state.get_str("expression"),
            comments: state.get_str("comments"),
            priority: TRIGGER_PRIORITIES
                .decode(&state.get_str("priority"))?
                .to_owned(),
            status: flag(!state.get_bool("enabled")),
            kind: flag(state.get_bool("multiple")),
            url: state.get_str("url"),
            recovery_mode: "0".into(),
            correlation_mode: "0".into(),
            manual_close: flag(state.get_bool("manual_close")),
            dependencies: id_set(state, "dependencies")
                .into_iter()
                .map(|triggerid| TriggerRef { triggerid })
                .collect(),
            tags: tag_payload(state),
            ..Self::default()
        };

        let recovery = state.get_str("recovery_expression");
        if state.get_bool("recovery_none") {
            trigger.recovery_mode = RECOVERY_NONE.into();
        } else if !recovery.is_empty() {
            trigger.recovery_mode = RECOVERY_EXPRESSION.into();
            trigger.recovery_expression = recovery;
        }

        let tag = state.get_str("correlation_tag");
        if !tag.is_empty() {
            trigger.correlation_mode = CORRELATION_TAG.into();
            trigger.correlation_tag = tag;
        }
        Ok(trigger)
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "name", &self.description)?;
        put(state, "expression", &self.expression)?;
        put(state, "comments", &self.comments)?;
        put(state, "priority", TRIGGER_PRIORITIES.encode(&self.priority)?)?;
        state.set("enabled", (self.status == "0").into())?;
        state.set("multiple", is_flag_set(&self.kind).into())?;
        put(state, "url", &self.url)?;
        state.set("recovery_none", (self.recovery_mode == RECOVERY_NONE).into())?;
        let recovery = if self.recovery_mode == RECOVERY_EXPRESSION
            && self.recovery_expression.is_empty()
        {
            MISSING_RECOVERY_EXPRESSION
        } else {
            self.recovery_expression.as_str()
        };
        put(state, "recovery_expression", recovery)?;
        let tag = if self.correlation_mode == CORRELATION_TAG && self.correlation_tag.is_empty()
        {
            MISSING_CORRELATION_TAG
        } else {
            self.correlation_tag.as_str()
        };
        put(state, "correlation_tag", tag)?;
        state.set("manual_close", is_flag_set(&self.manual_close).into())?;
        state.set(
            "dependencies",
            flatten_ids(self.dependencies.iter().map(|d| d.triggerid.as_str())),
        )?;
        state.set("tag", flatten_tags(self.tags.as_deref().unwrap_or_default()))
    }

    fn apply_clears(&mut self, state: &dyn StateStore) -> Result<(), CoreError> {
        if self.tags.is_none() && differ::emptied(state, "tag") {
            self.tags = Some(Vec::new());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::ResourceData;
    use crate::value::FieldValue;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn state() -> ResourceData {
        ResourceData::new(Arc::new(TRIGGER.clone()))
            .with("name", "High CPU")
            .unwrap()
            .with("expression", "{web01:system.cpu.load.last()}>5")
            .unwrap()
    }

    #[test]
    fn recovery_none_wins_over_expression() {
        let state = state()
            .with("recovery_none", true)
            .unwrap()
            .with("recovery_expression", "{web01:system.cpu.load.last()}<2")
            .unwrap();
        let trigger = Trigger::build(&state, &VersionGate::default()).unwrap();
        assert_eq!(trigger.recovery_mode, "2");
        assert_eq!(trigger.recovery_expression, "");
    }

    #[test]
    fn roundtrip_through_wire() {
        let state = state()
            .with("priority", "high")
            .unwrap()
            .with("correlation_tag", "service")
            .unwrap()
            .with("dependencies", FieldValue::strings(["13000"]))
            .unwrap()
            .with(
                "tag",
                FieldValue::List(vec![FieldValue::block([("key", "scope".into())])]),
            )
            .unwrap();
        let trigger = Trigger::build(&state, &VersionGate::default()).unwrap();
        assert_eq!(trigger.priority, "4");
        assert_eq!(trigger.correlation_mode, "1");

        let mut read_back = ResourceData::new(Arc::clone(state.schema()));
        trigger.flatten(&mut read_back, &VersionGate::default()).unwrap();
        for field in ["name", "priority", "enabled", "correlation_tag", "dependencies", "tag"] {
            assert_eq!(read_back.get(field), state.get(field), "{field}");
        }
    }

    fn read_back(trigger: &Trigger) -> ResourceData {
        let mut state = ResourceData::existing(
            Arc::new(TRIGGER.clone()),
            "13001",
            [
                ("name", FieldValue::from("High CPU")),
                ("expression", FieldValue::from("{web01:system.cpu.load.last()}>5")),
            ],
        );
        trigger.flatten(&mut state, &VersionGate::default()).unwrap();
        state
    }

    #[test]
    fn recovery_mode_without_expression_reads_as_drift() {
        let trigger = Trigger {
            triggerid: "13001".into(),
            priority: "0".into(),
            recovery_mode: "1".into(),
            ..Trigger::default()
        };
        let state = read_back(&trigger);
        assert_eq!(
            state.get_str("recovery_expression"),
            "<recovery_mode_enabled_no_expression>"
        );
        assert!(state.has_change("recovery_expression"));

        let cleared = state.with("recovery_expression", "").unwrap();
        let rebuilt = Trigger::build(&cleared, &VersionGate::default()).unwrap();
        assert_eq!(rebuilt.recovery_mode, "0");
    }

    #[test]
    fn correlation_mode_without_tag_reads_as_drift() {
        let trigger = Trigger {
            triggerid: "13001".into(),
            priority: "0".into(),
            correlation_mode: "1".into(),
            ..Trigger::default()
        };
        let state = read_back(&trigger);
        assert_eq!(state.get_str("correlation_tag"), "<correlation_enabled_no_tag>");
        assert!(state.has_change("correlation_tag"));

        let cleared = state.with("correlation_tag", "").unwrap();
        let rebuilt = Trigger::build(&cleared, &VersionGate::default()).unwrap();
        assert_eq!(rebuilt.correlation_mode, "0");
    }

    #[test]
    fn complete_modes_read_back_verbatim() {
        let trigger = Trigger {
            triggerid: "13001".into(),
            priority: "0".into(),
            recovery_mode: "1".into(),
            recovery_expression: "{web01:system.cpu.load.last()}<2".into(),
            correlation_mode: "1".into(),
            correlation_tag: "service".into(),
            ..Trigger::default()
        };
        let state = read_back(&trigger);
        assert_eq!(state.get_str("recovery_expression"), "{web01:system.cpu.load.last()}<2");
        assert_eq!(state.get_str("correlation_tag"), "service");
    }

    #[test]
    fn emptied_tags_are_cleared_on_update() {
        let mut state = ResourceData::existing(
            Arc::new(TRIGGER.clone()),
            "13001",
            [
                ("name", FieldValue::from("High CPU")),
                ("expression", FieldValue::from("{web01:system.cpu.load.last()}>5")),
                (
                    "tag",
                    FieldValue::List(vec![FieldValue::block([("key", "scope".into())])]),
                ),
            ],
        );
        state.set("tag", FieldValue::List(Vec::new())).unwrap();
        let mut trigger = Trigger::build(&state, &VersionGate::default()).unwrap();
        assert_eq!(trigger.tags, None);
        trigger.apply_clears(&state).unwrap();
        assert_eq!(trigger.tags, Some(Vec::new()));
    }
}
