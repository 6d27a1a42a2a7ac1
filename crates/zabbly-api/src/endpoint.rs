// ── API object endpoints ──
//
// One `Endpoint` per remote object family. It names the method prefix
// (`item` → `item.get`, `item.create`...), the identifier key used both in
// `*.get` filters and in create/update responses, and the related
// sub-objects to request on read.

use serde_json::{Map, Value, json};

/// Static description of one remote object family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Method prefix, e.g. `"itemprototype"`.
    pub object: &'static str,
    /// Identifier list key, e.g. `"itemids"`.
    pub ids: &'static str,
    /// `selectX` flags requested as `"extend"` on every read.
    pub selects: &'static [&'static str],
}

impl Endpoint {
    pub fn method(&self, verb: &str) -> String {
        format!("{}.{verb}", self.object)
    }

    /// Base `*.get` parameters: full output plus every related sub-object.
    pub fn get_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("output".into(), json!("extend"));
        for select in self.selects {
            params.insert((*select).into(), json!("extend"));
        }
        params
    }

    /// `*.get` parameters restricted to a single identifier.
    pub fn get_by_id(&self, id: &str) -> Value {
        let mut params = self.get_params();
        params.insert(self.ids.into(), json!([id]));
        Value::Object(params)
    }

    /// `*.get` parameters restricted by an exact-match filter.
    pub fn get_by_filter(&self, filter: Map<String, Value>) -> Value {
        let mut params = self.get_params();
        params.insert("filter".into(), Value::Object(filter));
        Value::Object(params)
    }
}

pub const ITEM: Endpoint = Endpoint {
    object: "item",
    ids: "itemids",
    selects: &["selectPreprocessing", "selectApplications"],
};

pub const ITEM_PROTOTYPE: Endpoint = Endpoint {
    object: "itemprototype",
    ids: "itemids",
    selects: &[
        "selectPreprocessing",
        "selectApplications",
        "selectDiscoveryRule",
    ],
};

pub const DISCOVERY_RULE: Endpoint = Endpoint {
    object: "discoveryrule",
    ids: "itemids",
    selects: &["selectPreprocessing", "selectLLDMacroPaths", "selectFilter"],
};

pub const HOST: Endpoint = Endpoint {
    object: "host",
    ids: "hostids",
    selects: &[
        "selectInterfaces",
        "selectParentTemplates",
        "selectGroups",
        "selectMacros",
        "selectTags",
    ],
};

pub const TEMPLATE: Endpoint = Endpoint {
    object: "template",
    ids: "templateids",
    selects: &[
        "selectParentTemplates",
        "selectGroups",
        "selectMacros",
        "selectTags",
    ],
};

pub const TRIGGER: Endpoint = Endpoint {
    object: "trigger",
    ids: "triggerids",
    selects: &["selectDependencies", "selectTags", "expandExpression"],
};

pub const GRAPH: Endpoint = Endpoint {
    object: "graph",
    ids: "graphids",
    selects: &["selectGraphItems"],
};

pub const GRAPH_PROTOTYPE: Endpoint = Endpoint {
    object: "graphprototype",
    ids: "graphids",
    selects: &["selectGraphItems"],
};

pub const APPLICATION: Endpoint = Endpoint {
    object: "application",
    ids: "applicationids",
    selects: &[],
};

pub const HOST_GROUP: Endpoint = Endpoint {
    object: "hostgroup",
    ids: "groupids",
    selects: &[],
};

pub const PROXY: Endpoint = Endpoint {
    object: "proxy",
    ids: "proxyids",
    selects: &[],
};
