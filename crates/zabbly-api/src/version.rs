// ── Remote API version ──
//
// The remote system self-reports a dotted version string ("5.0.3").
// Everything version-dependent downstream compares the packed integer
// form `major*10000 + minor*100 + patch`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Negotiated remote API version in packed integer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(u32);

impl ApiVersion {
    /// 5.0.0: unified SNMP agent items and interface `details` objects.
    pub const V5_0: Self = Self(50_000);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self(major * 10_000 + minor * 100 + patch)
    }

    pub const fn from_packed(packed: u32) -> Self {
        Self(packed)
    }

    pub const fn packed(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 / 10_000
    }

    pub const fn minor(self) -> u32 {
        self.0 / 100 % 100
    }

    pub const fn patch(self) -> u32 {
        self.0 % 100
    }

    /// Parse a dotted version string.
    ///
    /// Missing trailing components default to zero. Components must be
    /// unsigned integers; minor and patch must stay below 100 so the packed
    /// form stays unambiguous.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidVersion {
            raw: raw.to_owned(),
            reason,
        };

        let parts: Vec<&str> = raw.trim().split('.').collect();
        if parts.len() > 3 {
            return Err(invalid(format!(
                "expected at most 3 components, found {}",
                parts.len()
            )));
        }

        let mut packed = [0_u32; 3];
        for (slot, part) in packed.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(format!("component '{part}' is not numeric")));
            }
            *slot = part
                .parse()
                .map_err(|e| invalid(format!("component '{part}': {e}")))?;
        }

        let [major, minor, patch] = packed;
        if minor > 99 || patch > 99 {
            return Err(invalid("minor and patch must be below 100".into()));
        }
        if major > 400_000 {
            return Err(invalid(format!("major version {major} is out of range")));
        }
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
