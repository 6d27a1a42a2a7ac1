use serde::{Deserialize, Serialize};

use super::de;
use super::trigger::Tag;

// ── References ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId {
    pub groupid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId {
    pub templateid: String,
}

/// User macro on a host or template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macro {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostmacroid: String,
    #[serde(rename = "macro")]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

// ── Interfaces ──────────────────────────────────────────────────────

/// SNMP settings nested under an interface (5.0+).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDetails {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub bulk: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub community: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub securityname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub securitylevel: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authpassphrase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub privpassphrase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authprotocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub privprotocol: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contextname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInterface {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interfaceid: String,
    #[serde(default)]
    pub dns: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub port: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub useip: String,
    /// Top-level SNMP bulk flag of pre-5.0 servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::object_or_empty"
    )]
    pub details: Option<InterfaceDetails>,
}

// ── Hosts & templates ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostid: String,
    pub host: String,
    /// Visible name; the remote defaults it to `host` when omitted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub proxy_hostid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub interfaces: Vec<HostInterface>,
    #[serde(default)]
    pub groups: Vec<GroupId>,
    #[serde(default)]
    pub templates: Vec<TemplateId>,
    #[serde(rename = "parentTemplates", default, skip_serializing)]
    pub parent_templates: Vec<TemplateId>,
    /// Templates to unlink and clear; never echoed by the remote.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates_clear: Vec<TemplateId>,
    #[serde(default)]
    pub macros: Vec<Macro>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub templateid: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub groups: Vec<GroupId>,
    #[serde(default)]
    pub templates: Vec<TemplateId>,
    #[serde(rename = "parentTemplates", default, skip_serializing)]
    pub parent_templates: Vec<TemplateId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates_clear: Vec<TemplateId>,
    #[serde(default)]
    pub macros: Vec<Macro>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

// ── Directory objects ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub groupid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proxyid: String,
    pub host: String,
}

/// Item grouping on pre-5.4 servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub applicationid: String,
    pub name: String,
    #[serde(default)]
    pub hostid: String,
}
