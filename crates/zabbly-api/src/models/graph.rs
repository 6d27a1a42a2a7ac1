use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gitemid: String,
    pub color: String,
    pub itemid: String,
    #[serde(default)]
    pub calc_fnc: String,
    #[serde(default)]
    pub drawtype: String,
    #[serde(default)]
    pub sortorder: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub yaxisside: String,
}

/// Graph or graph prototype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub graphid: String,
    pub name: String,
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub graphtype: String,
    #[serde(default)]
    pub percent_left: String,
    #[serde(default)]
    pub percent_right: String,
    #[serde(default)]
    pub show_3d: String,
    #[serde(default)]
    pub show_legend: String,
    #[serde(default)]
    pub show_work_period: String,
    #[serde(default)]
    pub ymin_type: String,
    #[serde(default)]
    pub ymax_type: String,
    #[serde(default)]
    pub yaxismin: String,
    #[serde(default)]
    pub yaxismax: String,
    #[serde(default)]
    pub ymin_itemid: String,
    #[serde(default)]
    pub ymax_itemid: String,
    #[serde(default)]
    pub gitems: Vec<GraphItem>,
}
