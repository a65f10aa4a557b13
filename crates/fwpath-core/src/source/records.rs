// ── Wire-level reference data records ──
//
// Loose, vendor-shaped records as they arrive from a policy source. Fields
// are deliberately permissive (optional, string-typed, one-or-many) so a
// single bad record can be rejected during conversion instead of failing
// deserialization of the whole document. FortiOS field names are accepted
// as aliases where they differ.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A string or integer scalar (FortiOS policy IDs are numeric).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// A single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(s: &str) -> Self {
        Self::One(s.to_owned())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// Address object record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(default)]
    pub name: String,
    /// `subnet`, `iprange`/`range`, `fqdn` or `group`; inferred when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(default, alias = "start-ip", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, alias = "end-ip", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(default, alias = "member", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// One port specification: `443`, `"8000-8080"` or `[20, 21]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Number(u64),
    Text(String),
    Pair(Vec<u64>),
}

/// Service object record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, alias = "port_ranges", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortSpec>,
}

/// Zone record. Ownership may instead come from a firewall's `zones`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub networks: Vec<String>,
    #[serde(default, alias = "owning_firewall", skip_serializing_if = "Option::is_none")]
    pub firewall: Option<String>,
}

/// Firewall device record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
}

/// Firewall policy record. Missing match fields mean "any" / "all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    #[serde(default, alias = "policyid", skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Evaluation order; defaults to the record's 1-based list position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, alias = "srcintf", skip_serializing_if = "Option::is_none")]
    pub src_zones: Option<OneOrMany>,
    #[serde(default, alias = "dstintf", skip_serializing_if = "Option::is_none")]
    pub dst_zones: Option<OneOrMany>,
    #[serde(default, alias = "srcaddr", skip_serializing_if = "Option::is_none")]
    pub src_addrs: Option<OneOrMany>,
    #[serde(default, alias = "dstaddr", skip_serializing_if = "Option::is_none")]
    pub dst_addrs: Option<OneOrMany>,
    #[serde(default, alias = "service", skip_serializing_if = "Option::is_none")]
    pub services: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat: Option<bool>,
}

impl PolicyRecord {
    /// Any-to-any record with the given action; fields narrowed by callers.
    pub fn new(id: impl Into<Scalar>, action: &str) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
            order: None,
            src_zones: None,
            dst_zones: None,
            src_addrs: None,
            dst_addrs: None,
            services: None,
            action: Some(action.to_owned()),
            enabled: None,
            nat: None,
        }
    }
}

/// Operator-known hop sequence for a zone pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub from: String,
    pub to: String,
    pub firewalls: Vec<String>,
}
