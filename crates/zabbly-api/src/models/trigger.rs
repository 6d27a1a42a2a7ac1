use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerRef {
    pub triggerid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub triggerid: String,
    /// Trigger name (the API calls it `description`).
    pub description: String,
    pub expression: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub status: String,
    /// `1` generates a problem event on every evaluation.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub recovery_mode: String,
    #[serde(default)]
    pub recovery_expression: String,
    #[serde(default)]
    pub correlation_mode: String,
    #[serde(default)]
    pub correlation_tag: String,
    #[serde(default)]
    pub manual_close: String,
    #[serde(default)]
    pub dependencies: Vec<TriggerRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_empty_tags_are_serialized() {
        let trigger = Trigger {
            description: "High CPU".into(),
            expression: "{web01:system.cpu.load.last()}>5".into(),
            tags: Some(Vec::new()),
            ..Trigger::default()
        };
        let value = serde_json::to_value(&trigger).unwrap();
        assert_eq!(value["tags"], json!([]));
    }

    #[test]
    fn dependencies_ignore_extra_fields() {
        let trigger: Trigger = serde_json::from_value(json!({
            "triggerid": "13",
            "description": "down",
            "expression": "{h:k.last()}=0",
            "dependencies": [{"triggerid": "12", "description": "upstream"}]
        }))
        .unwrap();
        assert_eq!(trigger.dependencies, vec![TriggerRef { triggerid: "12".into() }]);
    }
}
