// ── Nested collections ──
//
// Block shapes of every repeated sub-object, and the conversions between
// declarative lists/sets of blocks and wire arrays. Lists keep declared
// order; sets are emitted in set order and compared by content.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use zabbly_api::models::{
    FilterCondition, GraphItem, HostInterface, InterfaceDetails, Macro, MacroPath, Preprocessor,
    Tag,
};

use crate::codec::{
    self, GRAPH_DRAW_TYPES, GRAPH_FUNCTIONS, GRAPH_ITEM_TYPES, GRAPH_SIDES, INTERFACE_TYPES,
    LLD_OPERATORS, SNMP_AUTH_PROTOCOLS, SNMP_INTERFACE_VERSIONS, SNMP_PRIV_PROTOCOLS,
    SNMP_SECURITY_LEVELS,
};
use crate::error::CoreError;
use crate::gate::{InterfaceSnmpMode, VersionGate};
use crate::schema::{Element, FieldDescriptor, FieldSet, Validator};
use crate::state::StateStore;
use crate::value::{Block, BlockExt, FieldValue};

/// Separator of multi-valued preprocessing parameters on the wire.
pub const PARAM_SEPARATOR: char = '\n';

/// Wire representation of a boolean flag.
pub fn flag(on: bool) -> String {
    if on { "1" } else { "0" }.to_owned()
}

pub fn is_flag_set(code: &str) -> bool {
    code == "1"
}

// ── Preprocessors ───────────────────────────────────────────────────

pub static PREPROCESSOR_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("type")
            .required()
            .validate(Validator::Numeric)
            .describe("Preprocessing step type code"),
        FieldDescriptor::list("params", Element::String)
            .describe("Step parameters, in order"),
        FieldDescriptor::string("error_handler")
            .default("")
            .validate(Validator::Numeric),
        FieldDescriptor::string("error_handler_params").default(""),
    ])
});

pub fn join_params(params: &[String]) -> String {
    params.join(&PARAM_SEPARATOR.to_string())
}

/// Split wire parameters back into a list.
///
/// An empty string is zero parameters. `expected` is the parameter count
/// last seen in state for the same step: the split stops there, so the
/// final parameter keeps any newlines of its own (scripts, multi-line
/// patterns). Without a hint every newline is a separator, so a newline
/// inside a parameter cannot be told apart from two parameters.
pub fn split_params(raw: &str, expected: Option<usize>) -> Vec<String> {
    match expected {
        Some(n) if n > 0 => raw.splitn(n, PARAM_SEPARATOR).map(str::to_owned).collect(),
        _ if raw.is_empty() => Vec::new(),
        _ => raw.split(PARAM_SEPARATOR).map(str::to_owned).collect(),
    }
}

pub fn build_preprocessors(state: &dyn StateStore, field: &str) -> Vec<Preprocessor> {
    state
        .get_blocks(field)
        .iter()
        .map(|step| Preprocessor {
            kind: step.text("type"),
            params: join_params(&step.texts("params")),
            error_handler: step.text("error_handler"),
            error_handler_params: step.text("error_handler_params"),
        })
        .collect()
}

/// `prior` is the state's current list for the same field, used as a
/// per-position split hint.
pub fn flatten_preprocessors(wire: &[Preprocessor], prior: &[Block]) -> FieldValue {
    FieldValue::List(
        wire.iter()
            .enumerate()
            .map(|(i, step)| {
                let hint = prior
                    .get(i)
                    .filter(|p| p.text("type") == step.kind)
                    .map(|p| p.texts("params").len());
                // "0" is the remote's explicit spelling of the default handler.
                let handler = match step.error_handler.as_str() {
                    "0" if step.error_handler_params.is_empty() => "",
                    other => other,
                };
                FieldValue::block([
                    ("type", FieldValue::from(step.kind.as_str())),
                    ("params", FieldValue::strings(split_params(&step.params, hint))),
                    ("error_handler", FieldValue::from(handler)),
                    (
                        "error_handler_params",
                        FieldValue::from(step.error_handler_params.as_str()),
                    ),
                ])
            })
            .collect(),
    )
}

// ── Tags ────────────────────────────────────────────────────────────

pub static TAG_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("key")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("value").default(""),
    ])
});

pub fn build_tags(state: &dyn StateStore, field: &str) -> Vec<Tag> {
    state
        .get_blocks(field)
        .iter()
        .map(|t| Tag {
            tag: t.text("key"),
            value: t.text("value"),
        })
        .collect()
}

pub fn flatten_tags(wire: &[Tag]) -> FieldValue {
    FieldValue::Set(
        wire.iter()
            .map(|t| {
                FieldValue::block([
                    ("key", FieldValue::from(t.tag.as_str())),
                    ("value", FieldValue::from(t.value.as_str())),
                ])
            })
            .collect(),
    )
}

// ── Macros ──────────────────────────────────────────────────────────

pub static MACRO_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("id").read_only(),
        FieldDescriptor::string("name")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("Macro name, e.g. {$PORT}"),
        FieldDescriptor::string("value").default(""),
    ])
});

pub fn build_macros(state: &dyn StateStore, field: &str) -> Vec<Macro> {
    state
        .get_blocks(field)
        .iter()
        .map(|m| Macro {
            hostmacroid: m.text("id"),
            name: m.text("name"),
            value: m.text("value"),
        })
        .collect()
}

pub fn flatten_macros(wire: &[Macro]) -> FieldValue {
    FieldValue::List(
        wire.iter()
            .map(|m| {
                FieldValue::block([
                    ("id", FieldValue::from(m.hostmacroid.as_str())),
                    ("name", FieldValue::from(m.name.as_str())),
                    ("value", FieldValue::from(m.value.as_str())),
                ])
            })
            .collect(),
    )
}

// ── Host interfaces ─────────────────────────────────────────────────

/// Interface fields that only exist as SNMP details.
const SNMP_DETAIL_FIELDS: [&str; 10] = [
    "snmp_version",
    "snmp_community",
    "snmp3_securityname",
    "snmp3_securitylevel",
    "snmp3_authpassphrase",
    "snmp3_authprotocol",
    "snmp3_privpassphrase",
    "snmp3_privprotocol",
    "snmp3_contextname",
    "snmp_bulk",
];

pub static INTERFACE_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("id").read_only(),
        FieldDescriptor::string("dns").default(""),
        FieldDescriptor::string("ip")
            .default("")
            .validate(Validator::IpAddress),
        FieldDescriptor::bool("main").default(true),
        FieldDescriptor::string("port")
            .computed()
            .validate(Validator::IntRange(1, 65535))
            .describe("Defaults to the standard port of the interface type"),
        FieldDescriptor::string("type")
            .default("agent")
            .validate(INTERFACE_TYPES.validator())
            .describe(INTERFACE_TYPES.describe("Interface type")),
        FieldDescriptor::string("snmp_version")
            .default("2")
            .validate(SNMP_INTERFACE_VERSIONS.validator()),
        FieldDescriptor::bool("snmp_bulk").default(true),
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

pub fn build_interfaces(
    state: &dyn StateStore,
    field: &str,
    gate: &VersionGate,
) -> Result<Vec<HostInterface>, CoreError> {
    let defaults = INTERFACE_BLOCK.fill(&Block::new());
    state
        .get_blocks(field)
        .iter()
        .enumerate()
        .map(|(i, block)| build_interface(block, &format!("{field}.{i}"), gate, &defaults))
        .collect()
}

fn build_interface(
    block: &Block,
    path: &str,
    gate: &VersionGate,
    defaults: &Block,
) -> Result<HostInterface, CoreError> {
    let ip = block.text("ip");
    let dns = block.text("dns");
    if ip.is_empty() && dns.is_empty() {
        return Err(CoreError::validation(
            path,
            "interface requires either an IP or DNS entry",
        ));
    }

    let token = block.text("type");
    let port = match block.text("port") {
        p if p.is_empty() => codec::default_port(&token).unwrap_or_default().to_owned(),
        p => p,
    };

    let mut iface = HostInterface {
        interfaceid: block.text("id"),
        useip: flag(!ip.is_empty()),
        dns,
        ip,
        main: flag(block.flag("main")),
        port,
        kind: INTERFACE_TYPES.decode(&token)?.to_owned(),
        bulk: None,
        details: None,
    };

    if token == "snmp" {
        match gate.interface_snmp_mode() {
            InterfaceSnmpMode::Details => iface.details = Some(build_details(block)?),
            InterfaceSnmpMode::Flat => {
                iface.bulk = Some(flag(block.flag("snmp_bulk")));
                for key in SNMP_DETAIL_FIELDS.iter().filter(|k| **k != "snmp_bulk") {
                    if block.get(*key) != defaults.get(*key) {
                        gate.note_dropped(&format!("{path}.{key}"));
                    }
                }
            }
        }
    }
    Ok(iface)
}

fn build_details(block: &Block) -> Result<InterfaceDetails, CoreError> {
    let version = block.text("snmp_version");
    let mut details = InterfaceDetails {
        version: SNMP_INTERFACE_VERSIONS.decode(&version)?.to_owned(),
        bulk: flag(block.flag("snmp_bulk")),
        ..InterfaceDetails::default()
    };
    if version == "3" {
        details.securityname = block.text("snmp3_securityname");
        details.securitylevel = SNMP_SECURITY_LEVELS
            .decode(&block.text("snmp3_securitylevel"))?
            .to_owned();
        details.authpassphrase = block.text("snmp3_authpassphrase");
        details.authprotocol = SNMP_AUTH_PROTOCOLS
            .decode(&block.text("snmp3_authprotocol"))?
            .to_owned();
        details.privpassphrase = block.text("snmp3_privpassphrase");
        details.privprotocol = SNMP_PRIV_PROTOCOLS
            .decode(&block.text("snmp3_privprotocol"))?
            .to_owned();
        details.contextname = block.text("snmp3_contextname");
    } else {
        details.community = block.text("snmp_community");
    }
    Ok(details)
}

/// Interfaces without SNMP details read back with every detail field at
/// its schema default.
pub fn flatten_interfaces(wire: &[HostInterface]) -> Result<FieldValue, CoreError> {
    let defaults = INTERFACE_BLOCK.fill(&Block::new());
    wire.iter()
        .map(|iface| {
            let mut block = defaults.clone();
            let mut put = |key: &str, value: FieldValue| {
                block.insert(key.to_owned(), value);
            };
            put("id", iface.interfaceid.as_str().into());
            put("dns", iface.dns.as_str().into());
            put("ip", iface.ip.as_str().into());
            put("main", is_flag_set(&iface.main).into());
            put("port", iface.port.as_str().into());
            put("type", INTERFACE_TYPES.encode(&iface.kind)?.into());

            if let Some(bulk) = &iface.bulk {
                put("snmp_bulk", is_flag_set(bulk).into());
            }
            if let Some(d) = &iface.details {
                let version = SNMP_INTERFACE_VERSIONS.encode(&d.version)?;
                put("snmp_version", version.into());
                put("snmp_bulk", is_flag_set(&d.bulk).into());
                if version == "3" {
                    put("snmp3_securityname", d.securityname.as_str().into());
                    put(
                        "snmp3_securitylevel",
                        SNMP_SECURITY_LEVELS.encode(&d.securitylevel)?.into(),
                    );
                    put("snmp3_authpassphrase", d.authpassphrase.as_str().into());
                    put(
                        "snmp3_authprotocol",
                        SNMP_AUTH_PROTOCOLS.encode(&d.authprotocol)?.into(),
                    );
                    put("snmp3_privpassphrase", d.privpassphrase.as_str().into());
                    put(
                        "snmp3_privprotocol",
                        SNMP_PRIV_PROTOCOLS.encode(&d.privprotocol)?.into(),
                    );
                    put("snmp3_contextname", d.contextname.as_str().into());
                } else {
                    put("snmp_community", d.community.as_str().into());
                }
            }
            Ok(FieldValue::Block(block))
        })
        .collect::<Result<Vec<_>, CoreError>>()
        .map(FieldValue::List)
}

// ── Graph items ─────────────────────────────────────────────────────

pub static GRAPH_ITEM_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("id").read_only(),
        FieldDescriptor::string("color")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("Hex colour, e.g. 1A7C11"),
        FieldDescriptor::string("itemid")
            .required()
            .validate(Validator::Numeric),
        FieldDescriptor::string("function")
            .default("average")
            .validate(GRAPH_FUNCTIONS.validator())
            .describe(GRAPH_FUNCTIONS.describe("Aggregation function")),
        FieldDescriptor::string("drawtype")
            .default("line")
            .validate(GRAPH_DRAW_TYPES.validator())
            .describe(GRAPH_DRAW_TYPES.describe("Draw style")),
        FieldDescriptor::int("sortorder").default(0_i64),
        FieldDescriptor::string("type")
            .default("simple")
            .validate(GRAPH_ITEM_TYPES.validator()),
        FieldDescriptor::string("yaxis_side")
            .default("left")
            .validate(GRAPH_SIDES.validator()),
    ])
});

pub fn build_graph_items(state: &dyn StateStore, field: &str) -> Result<Vec<GraphItem>, CoreError> {
    state
        .get_blocks(field)
        .iter()
        .map(|g| {
            Ok(GraphItem {
                gitemid: g.text("id"),
                color: g.text("color"),
                itemid: g.text("itemid"),
                calc_fnc: GRAPH_FUNCTIONS.decode(&g.text("function"))?.to_owned(),
                drawtype: GRAPH_DRAW_TYPES.decode(&g.text("drawtype"))?.to_owned(),
                sortorder: g.int("sortorder").to_string(),
                kind: GRAPH_ITEM_TYPES.decode(&g.text("type"))?.to_owned(),
                yaxisside: GRAPH_SIDES.decode(&g.text("yaxis_side"))?.to_owned(),
            })
        })
        .collect()
}

pub fn flatten_graph_items(wire: &[GraphItem]) -> Result<FieldValue, CoreError> {
    wire.iter()
        .map(|g| {
            let sortorder = g.sortorder.parse::<i64>().map_err(|_| {
                CoreError::validation("item.sortorder", format!("'{}' is not an integer", g.sortorder))
            })?;
            Ok(FieldValue::block([
                ("id", FieldValue::from(g.gitemid.as_str())),
                ("color", FieldValue::from(g.color.as_str())),
                ("itemid", FieldValue::from(g.itemid.as_str())),
                ("function", GRAPH_FUNCTIONS.encode(&g.calc_fnc)?.into()),
                ("drawtype", GRAPH_DRAW_TYPES.encode(&g.drawtype)?.into()),
                ("sortorder", FieldValue::Int(sortorder)),
                ("type", GRAPH_ITEM_TYPES.encode(&g.kind)?.into()),
                ("yaxis_side", GRAPH_SIDES.encode(&g.yaxisside)?.into()),
            ]))
        })
        .collect::<Result<Vec<_>, CoreError>>()
        .map(FieldValue::List)
}

// ── LLD filter conditions & macro paths ─────────────────────────────

pub static CONDITION_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("id")
            .computed()
            .describe("Formula identifier (A, B, ...) used by custom formulas"),
        FieldDescriptor::string("macro")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("value").required(),
        FieldDescriptor::string("operator")
            .default("match")
            .validate(LLD_OPERATORS.validator()),
    ])
});

pub fn build_conditions(
    state: &dyn StateStore,
    field: &str,
) -> Result<Vec<FilterCondition>, CoreError> {
    state
        .get_blocks(field)
        .iter()
        .map(|c| {
            Ok(FilterCondition {
                lld_macro: c.text("macro"),
                value: c.text("value"),
                operator: LLD_OPERATORS.decode(&c.text("operator"))?.to_owned(),
                formulaid: c.text("id"),
            })
        })
        .collect()
}

pub fn flatten_conditions(wire: &[FilterCondition]) -> Result<FieldValue, CoreError> {
    wire.iter()
        .map(|c| {
            Ok(FieldValue::block([
                ("id", FieldValue::from(c.formulaid.as_str())),
                ("macro", FieldValue::from(c.lld_macro.as_str())),
                ("value", FieldValue::from(c.value.as_str())),
                ("operator", LLD_OPERATORS.encode(&c.operator)?.into()),
            ]))
        })
        .collect::<Result<Vec<_>, CoreError>>()
        .map(FieldValue::List)
}

pub static MACRO_PATH_BLOCK: LazyLock<FieldSet> = LazyLock::new(|| {
    FieldSet::new([
        FieldDescriptor::string("macro")
            .required()
            .validate(Validator::NotWhitespace),
        FieldDescriptor::string("path")
            .required()
            .validate(Validator::NotWhitespace)
            .describe("JSONPath to the macro value"),
    ])
});

pub fn build_macro_paths(state: &dyn StateStore, field: &str) -> Vec<MacroPath> {
    state
        .get_blocks(field)
        .iter()
        .map(|m| MacroPath {
            lld_macro: m.text("macro"),
            path: m.text("path"),
        })
        .collect()
}

pub fn flatten_macro_paths(wire: &[MacroPath]) -> FieldValue {
    FieldValue::Set(
        wire.iter()
            .map(|m| {
                FieldValue::block([
                    ("macro", FieldValue::from(m.lld_macro.as_str())),
                    ("path", FieldValue::from(m.path.as_str())),
                ])
            })
            .collect(),
    )
}

// ── Identifier sets & maps ──────────────────────────────────────────

/// Identifier set field (groups, templates, dependencies...) as a list.
pub fn id_set(state: &dyn StateStore, field: &str) -> Vec<String> {
    state.get_strings(field)
}

pub fn flatten_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> FieldValue {
    FieldValue::string_set(ids)
}

pub fn build_map(state: &dyn StateStore, field: &str) -> BTreeMap<String, String> {
    state
        .get(field)
        .as_block()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_owned())))
                .collect()
        })
        .unwrap_or_default()
}

pub fn flatten_map(map: &BTreeMap<String, String>) -> FieldValue {
    FieldValue::Block(
        map.iter()
            .map(|(k, v)| (k.clone(), FieldValue::from(v.as_str())))
            .collect(),
    )
}
