// ── Graphs & graph prototypes ──

use std::sync::LazyLock;

use zabbly_api::models::Graph;

use crate::codec::{GRAPH_AXIS_TYPES, GRAPH_TYPES};
use crate::collection::{
    GRAPH_ITEM_BLOCK, build_graph_items, flag, flatten_graph_items, is_flag_set,
};
use crate::error::CoreError;
use crate::gate::VersionGate;
use crate::schema::{Element, FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::{Entity, put, unset_zero};

pub static GRAPH: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("name")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("height")
            .default("250")
            .validate(Validator::IntRange(20, 65535)),
        FieldDescriptor::string("width")
            .default("900")
            .validate(Validator::IntRange(20, 65535)),
        FieldDescriptor::string("type")
            .default("normal")
            .validate(GRAPH_TYPES.validator())
            .describe(GRAPH_TYPES.describe("Graph layout")),
        FieldDescriptor::string("percent_left")
            .default("0")
            .validate(Validator::Decimal),
        FieldDescriptor::string("percent_right")
            .default("0")
            .validate(Validator::Decimal),
        FieldDescriptor::bool("do3d").default(false),
        FieldDescriptor::bool("legend").default(true),
        FieldDescriptor::bool("work_period").default(true),
        FieldDescriptor::string("ymax")
            .default("100")
            .validate(Validator::Decimal),
        FieldDescriptor::string("ymax_itemid").validate(Validator::Numeric),
        FieldDescriptor::string("ymax_type")
            .default("calculated")
            .validate(GRAPH_AXIS_TYPES.validator()),
        FieldDescriptor::string("ymin")
            .default("0")
            .validate(Validator::Decimal),
        FieldDescriptor::string("ymin_itemid").validate(Validator::Numeric),
        FieldDescriptor::string("ymin_type")
            .default("calculated")
            .validate(GRAPH_AXIS_TYPES.validator()),
        FieldDescriptor::list("item", Element::Block(GRAPH_ITEM_BLOCK.clone())).required(),
    ])
});

impl Entity for Graph {
    fn id(&self) -> &str {
        &self.graphid
    }

    fn set_id(&mut self, id: String) {
        self.graphid = id;
    }

    fn build(state: &dyn StateStore, _gate: &VersionGate) -> Result<Self, CoreError> {
        let axis_item = |field: &str| match state.get_str(field) {
            id if id.is_empty() => "0".to_owned(),
            id => id,
        };
        Ok(Self {
            graphid: state.id().to_owned(),
            name: state.get_str("name"),
            width: state.get_str("width"),
            height: state.get_str("height"),
            graphtype: GRAPH_TYPES.decode(&state.get_str("type"))?.to_owned(),
            percent_left: state.get_str("percent_left"),
            percent_right: state.get_str("percent_right"),
            show_3d: flag(state.get_bool("do3d")),
            show_legend: flag(state.get_bool("legend")),
            show_work_period: flag(state.get_bool("work_period")),
            ymin_type: GRAPH_AXIS_TYPES.decode(&state.get_str("ymin_type"))?.to_owned(),
            ymax_type: GRAPH_AXIS_TYPES.decode(&state.get_str("ymax_type"))?.to_owned(),
            yaxismin: state.get_str("ymin"),
            yaxismax: state.get_str("ymax"),
            ymin_itemid: axis_item("ymin_itemid"),
            ymax_itemid: axis_item("ymax_itemid"),
            gitems: build_graph_items(state, "item")?,
        })
    }

    fn flatten(&self, state: &mut dyn StateStore, _gate: &VersionGate) -> Result<(), CoreError> {
        put(state, "name", &self.name)?;
        put(state, "width", &self.width)?;
        put(state, "height", &self.height)?;
        put(state, "type", GRAPH_TYPES.encode(&self.graphtype)?)?;
        put(state, "percent_left", &self.percent_left)?;
        put(state, "percent_right", &self.percent_right)?;
        state.set("do3d", is_flag_set(&self.show_3d).into())?;
        state.set("legend", is_flag_set(&self.show_legend).into())?;
        state.set("work_period", is_flag_set(&self.show_work_period).into())?;
        put(state, "ymin_type", GRAPH_AXIS_TYPES.encode(&self.ymin_type)?)?;
        put(state, "ymax_type", GRAPH_AXIS_TYPES.encode(&self.ymax_type)?)?;
        put(state, "ymin", &self.yaxismin)?;
        put(state, "ymax", &self.yaxismax)?;
        put(state, "ymin_itemid", unset_zero(&self.ymin_itemid))?;
        put(state, "ymax_itemid", unset_zero(&self.ymax_itemid))?;
        state.set("item", flatten_graph_items(&self.gitems)?)
    }
}
