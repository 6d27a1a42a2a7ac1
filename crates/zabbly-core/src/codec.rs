// ── Enum codecs ──
//
// Bidirectional token <-> wire-code tables for every enumerated field.
// Each table is built once on first use and is immutable afterwards; the
// statics below only ever hand out shared references.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::CoreError;
use crate::schema::Validator;

/// One enumerated concept: logical tokens as written in declarative state,
/// and the codes the remote API uses for them.
#[derive(Debug)]
pub struct EnumCodec {
    name: &'static str,
    pairs: &'static [(&'static str, &'static str)],
    to_wire: HashMap<&'static str, &'static str>,
    from_wire: HashMap<&'static str, &'static str>,
}

impl EnumCodec {
    /// Build a codec from `(token, code)` pairs.
    ///
    /// # Panics
    ///
    /// On a duplicated token or wire code; such a table is a programming
    /// error, not a runtime condition.
    pub fn new(name: &'static str, pairs: &'static [(&'static str, &'static str)]) -> Self {
        let mut to_wire = HashMap::with_capacity(pairs.len());
        let mut from_wire = HashMap::with_capacity(pairs.len());
        for &(token, code) in pairs {
            assert!(
                to_wire.insert(token, code).is_none(),
                "{name}: duplicate token '{token}'"
            );
            assert!(
                from_wire.insert(code, token).is_none(),
                "{name}: duplicate wire code '{code}'"
            );
        }
        Self {
            name,
            pairs,
            to_wire,
            from_wire,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Logical token → wire code.
    pub fn decode(&self, token: &str) -> Result<&'static str, CoreError> {
        self.to_wire
            .get(token)
            .copied()
            .ok_or_else(|| CoreError::InvalidEnum {
                codec: self.name,
                value: token.to_owned(),
            })
    }

    /// Wire code → logical token.
    pub fn encode(&self, code: &str) -> Result<&'static str, CoreError> {
        self.from_wire
            .get(code)
            .copied()
            .ok_or_else(|| CoreError::InvalidEnum {
                codec: self.name,
                value: code.to_owned(),
            })
    }

    /// Valid tokens in declaration order.
    pub fn tokens(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|&(token, _)| token).collect()
    }

    /// Wire codes in declaration order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|&(_, code)| code).collect()
    }

    /// Membership predicate for schema validation.
    pub fn validator(&self) -> Validator {
        Validator::OneOf(self.tokens())
    }

    /// Human description listing the valid tokens.
    pub fn describe(&self, what: &str) -> String {
        format!("{what}, one of: {}", self.tokens().join(", "))
    }
}

macro_rules! codec {
    ($(#[$meta:meta])* $ident:ident, $name:literal, [$(($token:literal, $code:literal)),+ $(,)?]) => {
        $(#[$meta])*
        pub static $ident: LazyLock<EnumCodec> =
            LazyLock::new(|| EnumCodec::new($name, &[$(($token, $code)),+]));
    };
}

// ── Items ───────────────────────────────────────────────────────────

codec!(VALUE_TYPES, "value type", [
    ("float", "0"),
    ("character", "1"),
    ("log", "2"),
    ("unsigned", "3"),
    ("text", "4"),
]);

codec!(
    /// SNMP version token → pre-5.0 item type.
    SNMP_VERSIONS, "SNMP version", [("1", "1"), ("2", "4"), ("3", "6")]
);

codec!(SNMP_AUTH_PROTOCOLS, "SNMPv3 auth protocol", [("md5", "0"), ("sha", "1")]);

codec!(SNMP_PRIV_PROTOCOLS, "SNMPv3 privacy protocol", [("des", "0"), ("aes", "1")]);

codec!(SNMP_SECURITY_LEVELS, "SNMPv3 security level", [
    ("noauthnopriv", "0"),
    ("authnopriv", "1"),
    ("authpriv", "2"),
]);

codec!(HTTP_METHODS, "HTTP request method", [
    ("get", "0"),
    ("post", "1"),
    ("put", "2"),
    ("head", "3"),
]);

codec!(HTTP_POST_TYPES, "HTTP post type", [("raw", "0"), ("json", "2"), ("xml", "3")]);

codec!(HTTP_RETRIEVE_MODES, "HTTP retrieve mode", [
    ("body", "0"),
    ("headers", "1"),
    ("both", "2"),
]);

codec!(HTTP_AUTH_TYPES, "HTTP auth type", [
    ("none", "0"),
    ("basic", "1"),
    ("ntlm", "2"),
    ("kerberos", "3"),
]);

/// Item type codes. Not user-facing tokens: each item variant pins one.
pub mod item_type {
    pub const AGENT: &str = "0";
    pub const TRAPPER: &str = "2";
    pub const SIMPLE: &str = "3";
    pub const INTERNAL: &str = "5";
    pub const AGENT_ACTIVE: &str = "7";
    pub const AGGREGATE: &str = "8";
    pub const EXTERNAL: &str = "10";
    pub const CALCULATED: &str = "15";
    pub const SNMP_TRAP: &str = "17";
    pub const DEPENDENT: &str = "18";
    pub const HTTP_AGENT: &str = "19";
    pub const SNMP_AGENT: &str = "20";
}

// ── Low-level discovery ─────────────────────────────────────────────

codec!(LLD_EVAL_TYPES, "LLD filter evaluation type", [
    ("andor", "0"),
    ("and", "1"),
    ("or", "2"),
    ("custom", "3"),
]);

codec!(LLD_OPERATORS, "LLD condition operator", [("match", "8"), ("notmatch", "9")]);

// ── Hosts ───────────────────────────────────────────────────────────

codec!(INTERFACE_TYPES, "interface type", [
    ("agent", "1"),
    ("snmp", "2"),
    ("ipmi", "3"),
    ("jmx", "4"),
]);

codec!(SNMP_INTERFACE_VERSIONS, "SNMP interface version", [
    ("1", "1"),
    ("2", "2"),
    ("3", "3"),
]);

/// Port used when an interface declares none.
pub fn default_port(interface_type: &str) -> Option<&'static str> {
    match interface_type {
        "agent" => Some("10050"),
        "snmp" => Some("161"),
        "ipmi" => Some("623"),
        "jmx" => Some("8686"),
        _ => None,
    }
}

// ── Triggers ────────────────────────────────────────────────────────

codec!(TRIGGER_PRIORITIES, "trigger priority", [
    ("not_classified", "0"),
    ("info", "1"),
    ("warn", "2"),
    ("average", "3"),
    ("high", "4"),
    ("disaster", "5"),
]);

// ── Graphs ──────────────────────────────────────────────────────────

codec!(GRAPH_TYPES, "graph type", [
    ("normal", "0"),
    ("stacked", "1"),
    ("pie", "2"),
    ("exploded", "3"),
]);

codec!(GRAPH_AXIS_TYPES, "graph axis type", [
    ("calculated", "0"),
    ("fixed", "1"),
    ("item", "2"),
]);

codec!(GRAPH_FUNCTIONS, "graph item function", [
    ("min", "1"),
    ("average", "2"),
    ("max", "4"),
    ("all", "7"),
    ("last", "9"),
]);

codec!(GRAPH_DRAW_TYPES, "graph draw type", [
    ("line", "0"),
    ("filled", "1"),
    ("bold", "2"),
    ("dot", "3"),
    ("dashed", "4"),
    ("gradient", "5"),
]);

codec!(GRAPH_ITEM_TYPES, "graph item type", [("simple", "0"), ("sum", "2")]);

codec!(GRAPH_SIDES, "graph axis side", [("left", "0"), ("right", "1")]);

/// Every registered codec, for enumeration by external validators.
pub fn all() -> [&'static EnumCodec; 20] {
    [
        &*VALUE_TYPES,
        &*SNMP_VERSIONS,
        &*SNMP_AUTH_PROTOCOLS,
        &*SNMP_PRIV_PROTOCOLS,
        &*SNMP_SECURITY_LEVELS,
        &*HTTP_METHODS,
        &*HTTP_POST_TYPES,
        &*HTTP_RETRIEVE_MODES,
        &*HTTP_AUTH_TYPES,
        &*LLD_EVAL_TYPES,
        &*LLD_OPERATORS,
        &*INTERFACE_TYPES,
        &*SNMP_INTERFACE_VERSIONS,
        &*TRIGGER_PRIORITIES,
        &*GRAPH_TYPES,
        &*GRAPH_AXIS_TYPES,
        &*GRAPH_FUNCTIONS,
        &*GRAPH_DRAW_TYPES,
        &*GRAPH_ITEM_TYPES,
        &*GRAPH_SIDES,
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_codec_roundtrips_tokens_and_codes() {
        for codec in all() {
            for token in codec.tokens() {
                let code = codec.decode(token).unwrap();
                assert_eq!(codec.encode(code).unwrap(), token, "{}", codec.name());
            }
            for code in codec.codes() {
                let token = codec.encode(code).unwrap();
                assert_eq!(codec.decode(token).unwrap(), code, "{}", codec.name());
            }
        }
    }

    #[test]
    fn value_type_tokens_are_enumerable() {
        assert_eq!(
            VALUE_TYPES.tokens(),
            vec!["float", "character", "log", "unsigned", "text"]
        );
        assert_eq!(
            SNMP_SECURITY_LEVELS.tokens(),
            vec!["noauthnopriv", "authnopriv", "authpriv"]
        );
    }

    #[test]
    fn unknown_token_is_invalid_enum() {
        let err = VALUE_TYPES.decode("double").unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidEnum { codec: "value type", ref value } if value == "double"),
            "got {err:?}"
        );
    }

    #[test]
    fn unknown_code_is_invalid_enum() {
        assert!(TRIGGER_PRIORITIES.encode("9").is_err());
    }

    #[test]
    fn validator_lists_tokens() {
        assert_eq!(
            GRAPH_SIDES.validator(),
            Validator::OneOf(vec!["left", "right"])
        );
        assert_eq!(
            GRAPH_SIDES.describe("Y axis side"),
            "Y axis side, one of: left, right"
        );
    }

    #[test]
    #[should_panic(expected = "duplicate wire code")]
    fn duplicate_wire_code_panics_at_construction() {
        let _ = EnumCodec::new("broken", &[("a", "1"), ("b", "1")]);
    }

    #[test]
    #[should_panic(expected = "duplicate token")]
    fn duplicate_token_panics_at_construction() {
        let _ = EnumCodec::new("broken", &[("a", "1"), ("a", "2")]);
    }

    #[test]
    fn default_ports_cover_every_interface_type() {
        for token in INTERFACE_TYPES.tokens() {
            assert!(default_port(token).is_some(), "{token}");
        }
    }
}
