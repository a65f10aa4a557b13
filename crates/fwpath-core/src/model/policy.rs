// ── Firewall policy domain types ──
//
// The `"any"` / `"all"` / `"ALL"` sentinels vendors mix into object name
// lists are parsed once, when records are converted, into the `All`
// variants below. Evaluation never compares raw sentinel strings.

use std::fmt;

use serde::{Serialize, Serializer};

/// Action a policy takes when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Accept,
    Deny,
}

/// True for the sentinels that mean "match everything".
pub(crate) fn is_wildcard(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("any") || raw.eq_ignore_ascii_case("all")
}

/// Zone constraint on one side of a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneMatch {
    Any,
    Zones(Vec<String>),
}

impl ZoneMatch {
    /// Build from a list of zone names; any wildcard entry widens it to `Any`.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut zones = Vec::new();
        for name in names {
            let name = name.into();
            if is_wildcard(&name) {
                return Self::Any;
            }
            zones.push(name);
        }
        if zones.is_empty() {
            Self::Any
        } else {
            Self::Zones(zones)
        }
    }

    pub fn matches(&self, zone: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Zones(zones) => zones.iter().any(|z| z.eq_ignore_ascii_case(zone)),
        }
    }

    pub fn names(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::Zones(zones) => zones,
        }
    }
}

impl fmt::Display for ZoneMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Zones(zones) => f.write_str(&zones.join(",")),
        }
    }
}

impl Serialize for ZoneMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_str("any"),
            Self::Zones(zones) => zones.serialize(serializer),
        }
    }
}

/// Reference from a policy to an address object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddressRef {
    All,
    Named(String),
}

impl AddressRef {
    pub fn parse(raw: &str) -> Self {
        if is_wildcard(raw) {
            Self::All
        } else {
            Self::Named(raw.to_owned())
        }
    }
}

/// Reference from a policy to a service object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceRef {
    All,
    Named(String),
}

impl ServiceRef {
    pub fn parse(raw: &str) -> Self {
        if is_wildcard(raw) {
            Self::All
        } else {
            Self::Named(raw.to_owned())
        }
    }
}

impl fmt::Display for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for AddressRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for ServiceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Firewall Policy -- one ordered rule on a single firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallPolicy {
    pub id: String,
    pub name: Option<String>,
    pub order: i64,
    pub enabled: bool,
    pub action: PolicyAction,

    pub src_zones: ZoneMatch,
    pub dst_zones: ZoneMatch,
    pub src_addrs: Vec<AddressRef>,
    pub dst_addrs: Vec<AddressRef>,
    pub services: Vec<ServiceRef>,

    /// Informational: whether the policy itself enables NAT.
    pub nat: bool,
}

impl FirewallPolicy {
    /// An enabled any-to-any policy. Tests and builders narrow it from here.
    pub fn new(id: impl Into<String>, order: i64, action: PolicyAction) -> Self {
        Self {
            id: id.into(),
            name: None,
            order,
            enabled: true,
            action,
            src_zones: ZoneMatch::Any,
            dst_zones: ZoneMatch::Any,
            src_addrs: vec![AddressRef::All],
            dst_addrs: vec![AddressRef::All],
            services: vec![ServiceRef::All],
            nat: false,
        }
    }

    pub fn with_src_zones<I: IntoIterator<Item = S>, S: Into<String>>(mut self, zones: I) -> Self {
        self.src_zones = ZoneMatch::from_names(zones);
        self
    }

    pub fn with_dst_zones<I: IntoIterator<Item = S>, S: Into<String>>(mut self, zones: I) -> Self {
        self.dst_zones = ZoneMatch::from_names(zones);
        self
    }

    pub fn with_src_addrs<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, addrs: I) -> Self {
        self.src_addrs = addrs.into_iter().map(|a| AddressRef::parse(a.as_ref())).collect();
        self
    }

    pub fn with_dst_addrs<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, addrs: I) -> Self {
        self.dst_addrs = addrs.into_iter().map(|a| AddressRef::parse(a.as_ref())).collect();
        self
    }

    pub fn with_services<I: IntoIterator<Item = S>, S: AsRef<str>>(mut self, services: I) -> Self {
        self.services = services
            .into_iter()
            .map(|s| ServiceRef::parse(s.as_ref()))
            .collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
