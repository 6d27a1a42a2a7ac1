use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::de;

// ── Shared check configuration ──────────────────────────────────────

/// How an item or discovery rule collects data. Shared verbatim by items,
/// item prototypes and LLD rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// Item type code (agent, SNMP, HTTP agent...).
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaceid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_itemid: Option<String>,

    /// Formula of calculated items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,

    #[serde(flatten)]
    pub snmp: SnmpCheck,

    #[serde(flatten)]
    pub http: HttpCheck,
}

/// SNMP polling fields. Before 5.0 these carry the whole SNMP
/// configuration; from 5.0 on only the OID remains on the item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_oid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_authpassphrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_authprotocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_contextname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_privpassphrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_privprotocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_securitylevel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmpv3_securityname: Option<String>,
}

/// HTTP agent fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieve_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "de::header_map"
    )]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_codes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_peer: Option<String>,
}

// ── Preprocessing ───────────────────────────────────────────────────

/// One preprocessing step. `params` is newline-separated on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preprocessor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_handler: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_handler_params: String,
}

// ── Items ───────────────────────────────────────────────────────────

/// Parent discovery rule of an item prototype, as returned by
/// `selectDiscoveryRule`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub itemid: String,
}

/// Item or item prototype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub itemid: String,
    #[serde(default)]
    pub hostid: String,
    #[serde(rename = "key_", default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub preprocessing: Vec<Preprocessor>,
    #[serde(default, deserialize_with = "de::application_ids")]
    pub applications: Vec<String>,

    /// Parent discovery rule, written on prototype create.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ruleid: String,
    /// Parent discovery rule, as read back.
    #[serde(rename = "discoveryRule", default, skip_serializing)]
    pub discovery_rule: Option<RuleRef>,

    #[serde(flatten)]
    pub check: Check,
}

// ── Low-level discovery ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(rename = "macro")]
    pub lld_macro: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formulaid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LldFilter {
    #[serde(default)]
    pub evaltype: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formula: String,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacroPath {
    pub lld_macro: String,
    pub path: String,
}

/// Low-level discovery rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LldRule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub itemid: String,
    #[serde(default)]
    pub hostid: String,
    #[serde(rename = "key_", default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lifetime: String,
    #[serde(default)]
    pub preprocessing: Vec<Preprocessor>,
    #[serde(default)]
    pub lld_macro_paths: Vec<MacroPath>,
    #[serde(default)]
    pub filter: LldFilter,

    #[serde(flatten)]
    pub check: Check,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unset_variant_fields_stay_out_of_payload() {
        let item = Item {
            hostid: "10084".into(),
            key: "agent.ping".into(),
            name: "Ping".into(),
            value_type: "3".into(),
            check: Check {
                kind: "0".into(),
                interfaceid: Some("1".into()),
                delay: Some("1m".into()),
                ..Check::default()
            },
            ..Item::default()
        };

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "hostid": "10084",
                "key_": "agent.ping",
                "name": "Ping",
                "value_type": "3",
                "preprocessing": [],
                "applications": [],
                "type": "0",
                "interfaceid": "1",
                "delay": "1m",
            })
        );
    }

    #[test]
    fn item_read_accepts_application_objects_and_empty_headers() {
        let item: Item = serde_json::from_value(json!({
            "itemid": "100",
            "hostid": "10084",
            "key_": "web.page",
            "name": "Page",
            "type": "19",
            "value_type": "4",
            "url": "https://example.com",
            "headers": [],
            "applications": [{"applicationid": "7", "name": "Web"}],
            "preprocessing": [{"type": "1", "params": "55", "error_handler": "0", "error_handler_params": ""}],
            "discoveryRule": {"itemid": "900", "name": "rule"}
        }))
        .unwrap();

        assert_eq!(item.applications, vec!["7".to_owned()]);
        assert!(item.check.http.headers.is_empty());
        assert_eq!(item.check.http.url.as_deref(), Some("https://example.com"));
        assert_eq!(item.discovery_rule.unwrap().itemid, "900");
        assert_eq!(item.preprocessing[0].params, "55");
    }

    #[test]
    fn legacy_header_block_is_parsed() {
        let check: Check = serde_json::from_value(json!({
            "type": "19",
            "headers": "X-Token: abc\r\nAccept: text/plain\r\n"
        }))
        .unwrap();
        assert_eq!(check.http.headers.get("X-Token").map(String::as_str), Some("abc"));
        assert_eq!(check.http.headers.len(), 2);
    }

    #[test]
    fn lld_rule_reads_filter_and_macro_paths() {
        let rule: LldRule = serde_json::from_value(json!({
            "itemid": "200",
            "hostid": "10084",
            "key_": "vfs.fs.discovery",
            "name": "Filesystems",
            "type": "0",
            "lifetime": "30d",
            "filter": {
                "evaltype": "1",
                "formula": "",
                "eval_formula": "A",
                "conditions": [{"macro": "{#FSTYPE}", "value": "ext4", "operator": "8", "formulaid": "A"}]
            },
            "lld_macro_paths": [{"lld_macro": "{#NAME}", "path": "$.name"}]
        }))
        .unwrap();

        assert_eq!(rule.filter.conditions[0].lld_macro, "{#FSTYPE}");
        assert_eq!(rule.lld_macro_paths[0].path, "$.name");
    }
}
