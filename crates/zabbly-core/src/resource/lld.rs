// ── Low-level discovery rules ──

use std::sync::LazyLock;

use zabbly_api::models::{Check, LldFilter, LldRule};

use crate::codec::LLD_EVAL_TYPES;
use crate::collection::{
    CONDITION_BLOCK, MACRO_PATH_BLOCK, PREPROCESSOR_BLOCK, build_conditions, build_macro_paths,
    build_preprocessors, flatten_conditions, flatten_macro_paths, flatten_preprocessors,
};
use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{Element, FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::{Entity, put};

/// Fields shared by every discovery rule variant. Composed after the
/// variant fragments so its `delay` default wins over the item one.
pub static LLD_COMMON: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("hostid")
            .required()
            .force_new()
            .validate(Validator::Numeric)
            .describe("Host ID"),
        FieldDescriptor::string("key")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("name")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("delay")
            .default("3600")
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("lifetime")
            .default("30d")
            .validate(Validator::NotWhitespace)
            .describe("How long lost resources are kept"),
        FieldDescriptor::list("preprocessor", Element::Block(PREPROCESSOR_BLOCK.clone())),
        FieldDescriptor::string("evaltype")
            .default("andor")
            .validate(LLD_EVAL_TYPES.validator())
            .describe(LLD_EVAL_TYPES.describe("Filter evaluation")),
        FieldDescriptor::string("formula").describe("Custom filter formula, e.g. A and B"),
        FieldDescriptor::list("condition", Element::Block(CONDITION_BLOCK.clone())),
        FieldDescriptor::set("macropath", Element::Block(MACRO_PATH_BLOCK.clone())),
    ])
});

impl Entity for LldRule {
    fn id(&self) -> &str {
        &self.itemid
    }

    fn set_id(&mut self, id: String) {
        self.itemid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        let evaltype = state.get_str("evaltype");
        let formula = state.get_str("formula");
        if evaltype == "custom" && formula.is_empty() {
            return Err(CoreError::validation(
                "formula",
                "required when evaltype is custom",
            ));
        }

        Ok(Self {
            itemid: state.id().to_owned(),
            hostid: state.get_str("hostid"),
            key: state.get_str("key"),
            name: state.get_str("name"),
            lifetime: state.get_str("lifetime"),
            preprocessing: build_preprocessors(state, "preprocessor"),
            lld_macro_paths: build_macro_paths(state, "macropath"),
            filter: LldFilter {
                evaltype: LLD_EVAL_TYPES.decode(&evaltype)?.to_owned(),
                formula,
                conditions: build_conditions(state, "condition")?,
            },
            check: Check {
                delay: Some(state.get_str("delay")),
                ..Check::default()
            },
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "hostid", &self.hostid)?;
        put(state, "key", &self.key)?;
        put(state, "name", &self.name)?;
        if let Some(delay) = &self.check.delay {
            put(state, "delay", delay)?;
        }
        put(state, "lifetime", &self.lifetime)?;

        let prior = state.get_blocks("preprocessor");
        state.set("preprocessor", flatten_preprocessors(&self.preprocessing, &prior))?;
        state.set("macropath", flatten_macro_paths(&self.lld_macro_paths))?;

        put(state, "evaltype", LLD_EVAL_TYPES.encode(&self.filter.evaltype)?)?;
        put(state, "formula", &self.filter.formula)?;
        state.set("condition", flatten_conditions(&self.filter.conditions)?)
    }
}
