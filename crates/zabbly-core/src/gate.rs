// ── Version gate ──
//
// Every decision that depends on the negotiated remote version is made
// here. Builders ask which representation to use; they never compare
// version numbers themselves.

use tracing::warn;
use zabbly_api::ApiVersion;

use crate::state::StateStore;

/// How SNMP polling is expressed on items and discovery rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpItemMode {
    /// Pre-5.0: one item type per SNMP version, credentials on the item.
    PerVersion,
    /// 5.0+: single SNMP agent type, credentials on the host interface.
    Unified,
}

/// Where SNMP settings of a host interface live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceSnmpMode {
    /// Pre-5.0: only a top-level `bulk` flag.
    Flat,
    /// 5.0+: nested `details` object.
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionGate {
    version: ApiVersion,
}

impl VersionGate {
    pub const fn new(version: ApiVersion) -> Self {
        Self { version }
    }

    pub const fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn snmp_item_mode(&self) -> SnmpItemMode {
        if self.version >= ApiVersion::V5_0 {
            SnmpItemMode::Unified
        } else {
            SnmpItemMode::PerVersion
        }
    }

    pub fn interface_snmp_mode(&self) -> InterfaceSnmpMode {
        if self.version >= ApiVersion::V5_0 {
            InterfaceSnmpMode::Details
        } else {
            InterfaceSnmpMode::Flat
        }
    }

    /// Log configured fields the negotiated version cannot represent.
    ///
    /// The fields are left out of the wire object; this never fails.
    pub fn drop_unrepresentable(&self, state: &dyn StateStore, fields: &[&str]) {
        for field in fields {
            if state.configured(field).is_some_and(|v| !v.is_zero()) {
                self.note_dropped(field);
            }
        }
    }

    pub fn note_dropped(&self, field: &str) {
        warn!(
            field,
            version = %self.version,
            "field is not supported by this API version and is ignored"
        );
    }
}

impl Default for VersionGate {
    fn default() -> Self {
        Self::new(ApiVersion::V5_0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_selects_representation() {
        let old = VersionGate::new(ApiVersion::new(4, 4, 10));
        let new = VersionGate::new(ApiVersion::new(5, 0, 0));

        assert_eq!(old.snmp_item_mode(), SnmpItemMode::PerVersion);
        assert_eq!(old.interface_snmp_mode(), InterfaceSnmpMode::Flat);
        assert_eq!(new.snmp_item_mode(), SnmpItemMode::Unified);
        assert_eq!(new.interface_snmp_mode(), InterfaceSnmpMode::Details);
    }

    #[test]
    fn later_versions_stay_unified() {
        let gate = VersionGate::new(ApiVersion::new(6, 4, 2));
        assert_eq!(gate.snmp_item_mode(), SnmpItemMode::Unified);
    }
}
