// ── Polling variants ──
//
// Schema fragments and hooks for the fields that distinguish one item
// variant from another: how the value is collected (agent, SNMP, HTTP,
// formula, master item...). Items, item prototypes and discovery rules
// share them through `Polled`.

use std::sync::LazyLock;

use zabbly_api::models::{Check, Item, LldRule};

use crate::codec::{
    HTTP_AUTH_TYPES, HTTP_METHODS, HTTP_POST_TYPES, HTTP_RETRIEVE_MODES, SNMP_AUTH_PROTOCOLS,
    SNMP_PRIV_PROTOCOLS, SNMP_SECURITY_LEVELS, SNMP_VERSIONS, EnumCodec, item_type,
};
use crate::collection::{build_map, flag, flatten_map, is_flag_set};
use crate::error::CoreError;
use crate::gate::{SnmpItemMode, VersionGate};
use crate::schema::{FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;

use super::put;

/// Wire objects carrying polling settings.
pub trait Polled {
    fn check(&self) -> &Check;
    fn check_mut(&mut self) -> &mut Check;
}

impl Polled for Item {
    fn check(&self) -> &Check {
        &self.check
    }

    fn check_mut(&mut self) -> &mut Check {
        &mut self.check
    }
}

impl Polled for LldRule {
    fn check(&self) -> &Check {
        &self.check
    }

    fn check_mut(&mut self) -> &mut Check {
        &mut self.check
    }
}

// ── Fragments ───────────────────────────────────────────────────────

pub static DELAY: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("delay")
        .default("1m")
        .validate(Validator::NotWhitespace)
        .describe("Update interval, e.g. 1m or a flexible interval")])
});

pub static INTERFACE: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("interfaceid")
        .default("0")
        .validate(Validator::Numeric)
        .describe("Host interface ID, 0 for any")])
});

pub static AGENT: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::bool("active")
        .default(false)
        .describe("Use an active agent check")])
});

pub static SNMP: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("snmp_version")
            .default("2")
            .validate(SNMP_VERSIONS.validator())
            .describe(SNMP_VERSIONS.describe("SNMP version (before 5.0 only)")),
        FieldDescriptor::string("snmp_oid")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("snmp_community").default("{$SNMP_COMMUNITY}"),
        FieldDescriptor::string("snmp3_securityname").default("{$SNMP3_SECURITYNAME}"),
        FieldDescriptor::string("snmp3_securitylevel")
            .default("authpriv")
            .validate(SNMP_SECURITY_LEVELS.validator()),
        FieldDescriptor::string("snmp3_authpassphrase")
            .default("{$SNMP3_AUTHPASSPHRASE}")
            .sensitive(),
        FieldDescriptor::string("snmp3_authprotocol")
            .default("sha")
            .validate(SNMP_AUTH_PROTOCOLS.validator()),
        FieldDescriptor::string("snmp3_privpassphrase")
            .default("{$SNMP3_PRIVPASSPHRASE}")
            .sensitive(),
        FieldDescriptor::string("snmp3_privprotocol")
            .default("aes")
            .validate(SNMP_PRIV_PROTOCOLS.validator()),
        FieldDescriptor::string("snmp3_contextname").default("{$SNMP3_CONTEXTNAME}"),
    ])
});

pub static HTTP: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("url")
            .required()
            .validate(Validator::HttpUrl),
        FieldDescriptor::string("request_method")
            .default("get")
            .validate(HTTP_METHODS.validator())
            .describe(HTTP_METHODS.describe("HTTP method")),
        FieldDescriptor::string("post_type")
            .default("raw")
            .validate(HTTP_POST_TYPES.validator())
            .describe(HTTP_POST_TYPES.describe("Request body type")),
        FieldDescriptor::string("retrieve_mode")
            .default("body")
            .validate(HTTP_RETRIEVE_MODES.validator())
            .describe(HTTP_RETRIEVE_MODES.describe("Part of the response to store")),
        FieldDescriptor::string("auth_type")
            .default("none")
            .validate(HTTP_AUTH_TYPES.validator())
            .describe(HTTP_AUTH_TYPES.describe("HTTP authentication")),
        FieldDescriptor::string("username"),
        FieldDescriptor::string("password").sensitive(),
        FieldDescriptor::string("proxy").describe("HTTP proxy, e.g. http://proxy:3128"),
        FieldDescriptor::map("headers"),
        FieldDescriptor::string("posts").describe("Request body"),
        FieldDescriptor::string("status_codes").default("200"),
        FieldDescriptor::string("timeout")
            .default("3s")
            .validate(Validator::NotWhitespace),
        FieldDescriptor::bool("verify_host").default(true),
        FieldDescriptor::bool("verify_peer").default(true),
    ])
});

pub static CALCULATED: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("formula")
        .required()
        .validate(Validator::NotWhitespace)
        .describe("Calculation formula")])
});

pub static DEPENDENT: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([FieldDescriptor::string("master_itemid")
        .required()
        .validate(Validator::Numeric)
        .describe("Item providing the value")])
});

/// SNMP item fields only the per-version wire format can carry.
const LEGACY_SNMP_FIELDS: [&str; 9] = [
    "snmp_version",
    "snmp_community",
    "snmp3_securityname",
    "snmp3_securitylevel",
    "snmp3_authpassphrase",
    "snmp3_authprotocol",
    "snmp3_privpassphrase",
    "snmp3_privprotocol",
    "snmp3_contextname",
];

// ── Shared pieces ───────────────────────────────────────────────────

/// Item type plus the delay and interface, when the variant has them.
fn poll<W: Polled>(state: &dyn StateStore, object: &mut W, kind: &str) {
    let check = object.check_mut();
    check.kind = kind.to_owned();
    if state.declares("delay") {
        check.delay = Some(state.get_str("delay"));
    }
    if state.declares("interfaceid") {
        check.interfaceid = Some(state.get_str("interfaceid"));
    }
}

fn read_poll<W: Polled>(state: &mut dyn StateStore, object: &W) -> Result<(), CoreError> {
    let check = object.check();
    if state.declares("delay") {
        if let Some(delay) = &check.delay {
            put(state, "delay", delay)?;
        }
    }
    if state.declares("interfaceid") {
        put(state, "interfaceid", check.interfaceid.as_deref().unwrap_or("0"))?;
    }
    Ok(())
}

fn coded(codec: &EnumCodec, state: &dyn StateStore, field: &str) -> Result<Option<String>, CoreError> {
    codec.decode(&state.get_str(field)).map(|code| Some(code.to_owned()))
}

/// Set a token field from an optional wire code; absent codes leave the
/// field as configured.
fn read_coded(
    codec: &EnumCodec,
    state: &mut dyn StateStore,
    field: &str,
    code: Option<&String>,
) -> Result<(), CoreError> {
    match code {
        Some(code) => put(state, field, codec.encode(code)?),
        None => Ok(()),
    }
}

fn read_text(state: &mut dyn StateStore, field: &str, value: Option<&String>) -> Result<(), CoreError> {
    state.set_opt_str(field, value.map(String::as_str))
}

// ── Fixed-type variants ─────────────────────────────────────────────

/// Read side of every variant without fields of its own.
pub fn read_plain<W: Polled>(
    state: &mut dyn StateStore,
    _gate: &VersionGate,
    object: &W,
) -> Result<(), CoreError> {
    read_poll(state, object)
}

macro_rules! fixed_type {
    ($($(#[$meta:meta])* $name:ident => $code:expr),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name<W: Polled>(
                state: &dyn StateStore,
                _gate: &VersionGate,
                object: &mut W,
            ) -> Result<(), CoreError> {
                poll(state, object, $code);
                Ok(())
            }
        )+
    };
}

fixed_type! {
    write_simple => item_type::SIMPLE,
    write_internal => item_type::INTERNAL,
    write_external => item_type::EXTERNAL,
    write_trapper => item_type::TRAPPER,
    write_snmptrap => item_type::SNMP_TRAP,
    write_aggregate => item_type::AGGREGATE,
}

// ── Agent ───────────────────────────────────────────────────────────

pub fn write_agent<W: Polled>(
    state: &dyn StateStore,
    _gate: &VersionGate,
    object: &mut W,
) -> Result<(), CoreError> {
    let kind = if state.get_bool("active") {
        item_type::AGENT_ACTIVE
    } else {
        item_type::AGENT
    };
    poll(state, object, kind);
    Ok(())
}

pub fn read_agent<W: Polled>(
    state: &mut dyn StateStore,
    _gate: &VersionGate,
    object: &W,
) -> Result<(), CoreError> {
    read_poll(state, object)?;
    let active = object.check().kind == item_type::AGENT_ACTIVE;
    state.set("active", active.into())
}

// ── Calculated & dependent ──────────────────────────────────────────

pub fn write_calculated<W: Polled>(
    state: &dyn StateStore,
    _gate: &VersionGate,
    object: &mut W,
) -> Result<(), CoreError> {
    poll(state, object, item_type::CALCULATED);
    object.check_mut().params = Some(state.get_str("formula"));
    Ok(())
}

pub fn read_calculated<W: Polled>(
    state: &mut dyn StateStore,
    _gate: &VersionGate,
    object: &W,
) -> Result<(), CoreError> {
    read_poll(state, object)?;
    read_text(state, "formula", object.check().params.as_ref())
}

pub fn write_dependent<W: Polled>(
    state: &dyn StateStore,
    _gate: &VersionGate,
    object: &mut W,
) -> Result<(), CoreError> {
    poll(state, object, item_type::DEPENDENT);
    object.check_mut().master_itemid = Some(state.get_str("master_itemid"));
    Ok(())
}

pub fn read_dependent<W: Polled>(
    state: &mut dyn StateStore,
    _gate: &VersionGate,
    object: &W,
) -> Result<(), CoreError> {
    read_poll(state, object)?;
    read_text(state, "master_itemid", object.check().master_itemid.as_ref())
}

// ── SNMP ────────────────────────────────────────────────────────────

/// From 5.0 the item only carries the OID; version and credentials moved
/// to the host interface. Before 5.0 the item type encodes the version.
pub fn write_snmp<W: Polled>(
    state: &dyn StateStore,
    gate: &VersionGate,
    object: &mut W,
) -> Result<(), CoreError> {
    poll(state, object, item_type::SNMP_AGENT);
    let check = object.check_mut();
    check.snmp.snmp_oid = Some(state.get_str("snmp_oid"));

    match gate.snmp_item_mode() {
        SnmpItemMode::Unified => gate.drop_unrepresentable(state, &LEGACY_SNMP_FIELDS),
        SnmpItemMode::PerVersion => {
            let version = state.get_str("snmp_version");
            check.kind = SNMP_VERSIONS.decode(&version)?.to_owned();
            let snmp = &mut check.snmp;
            if version == "3" {
                snmp.snmpv3_securityname = Some(state.get_str("snmp3_securityname"));
                snmp.snmpv3_securitylevel =
                    coded(&SNMP_SECURITY_LEVELS, state, "snmp3_securitylevel")?;
                snmp.snmpv3_authpassphrase = Some(state.get_str("snmp3_authpassphrase"));
                snmp.snmpv3_authprotocol =
                    coded(&SNMP_AUTH_PROTOCOLS, state, "snmp3_authprotocol")?;
                snmp.snmpv3_privpassphrase = Some(state.get_str("snmp3_privpassphrase"));
                snmp.snmpv3_privprotocol = coded(&SNMP_PRIV_PROTOCOLS, state, "snmp3_privprotocol")?;
                snmp.snmpv3_contextname = Some(state.get_str("snmp3_contextname"));
            } else {
                snmp.snmp_community = Some(state.get_str("snmp_community"));
            }
        }
    }
    Ok(())
}

pub fn read_snmp<W: Polled>(
    state: &mut dyn StateStore,
    gate: &VersionGate,
    object: &W,
) -> Result<(), CoreError> {
    read_poll(state, object)?;
    let check = object.check();
    read_text(state, "snmp_oid", check.snmp.snmp_oid.as_ref())?;

    if gate.snmp_item_mode() == SnmpItemMode::Unified {
        return Ok(());
    }
    let version = SNMP_VERSIONS.encode(&check.kind)?;
    put(state, "snmp_version", version)?;
    let snmp = &check.snmp;
    if version == "3" {
        read_text(state, "snmp3_securityname", snmp.snmpv3_securityname.as_ref())?;
        read_coded(
            &SNMP_SECURITY_LEVELS,
            state,
            "snmp3_securitylevel",
            snmp.snmpv3_securitylevel.as_ref(),
        )?;
        read_text(state, "snmp3_authpassphrase", snmp.snmpv3_authpassphrase.as_ref())?;
        read_coded(
            &SNMP_AUTH_PROTOCOLS,
            state,
            "snmp3_authprotocol",
            snmp.snmpv3_authprotocol.as_ref(),
        )?;
        read_text(state, "snmp3_privpassphrase", snmp.snmpv3_privpassphrase.as_ref())?;
        read_coded(
            &SNMP_PRIV_PROTOCOLS,
            state,
            "snmp3_privprotocol",
            snmp.snmpv3_privprotocol.as_ref(),
        )?;
        read_text(state, "snmp3_contextname", snmp.snmpv3_contextname.as_ref())
    } else {
        read_text(state, "snmp_community", snmp.snmp_community.as_ref())
    }
}

// ── HTTP agent ──────────────────────────────────────────────────────

pub fn write_http<W: Polled>(
    state: &dyn StateStore,
    _gate: &VersionGate,
    object: &mut W,
) -> Result<(), CoreError> {
    poll(state, object, item_type::HTTP_AGENT);
    let http = &mut object.check_mut().http;
    http.url = Some(state.get_str("url"));
    http.request_method = coded(&HTTP_METHODS, state, "request_method")?;
    http.post_type = coded(&HTTP_POST_TYPES, state, "post_type")?;
    http.retrieve_mode = coded(&HTTP_RETRIEVE_MODES, state, "retrieve_mode")?;
    http.authtype = coded(&HTTP_AUTH_TYPES, state, "auth_type")?;
    http.username = Some(state.get_str("username"));
    http.password = Some(state.get_str("password"));
    http.http_proxy = Some(state.get_str("proxy"));
    http.headers = build_map(state, "headers");
    http.posts = Some(state.get_str("posts"));
    http.status_codes = Some(state.get_str("status_codes"));
    http.timeout = Some(state.get_str("timeout"));
    http.verify_host = Some(flag(state.get_bool("verify_host")));
    http.verify_peer = Some(flag(state.get_bool("verify_peer")));
    Ok(())
}

pub fn read_http<W: Polled>(
    state: &mut dyn StateStore,
    _gate: &VersionGate,
    object: &W,
) -> Result<(), CoreError> {
    read_poll(state, object)?;
    let http = &object.check().http;
    read_text(state, "url", http.url.as_ref())?;
    read_coded(&HTTP_METHODS, state, "request_method", http.request_method.as_ref())?;
    read_coded(&HTTP_POST_TYPES, state, "post_type", http.post_type.as_ref())?;
    read_coded(&HTTP_RETRIEVE_MODES, state, "retrieve_mode", http.retrieve_mode.as_ref())?;
    read_coded(&HTTP_AUTH_TYPES, state, "auth_type", http.authtype.as_ref())?;
    read_text(state, "username", http.username.as_ref())?;
    read_text(state, "password", http.password.as_ref())?;
    read_text(state, "proxy", http.http_proxy.as_ref())?;
    state.set("headers", flatten_map(&http.headers))?;
    read_text(state, "posts", http.posts.as_ref())?;
    read_text(state, "status_codes", http.status_codes.as_ref())?;
    read_text(state, "timeout", http.timeout.as_ref())?;
    if let Some(verify) = &http.verify_host {
        state.set("verify_host", is_flag_set(verify).into())?;
    }
    if let Some(verify) = &http.verify_peer {
        state.set("verify_peer", is_flag_set(verify).into())?;
    }
    Ok(())
}
