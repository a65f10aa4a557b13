// ── Address objects ──

use std::net::IpAddr;

use ipnet::IpNet;
use serde::Serialize;

/// What an address object stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AddressKind {
    Subnet { subnet: IpNet },
    Range { start: IpAddr, end: IpAddr },
    Fqdn { fqdn: String },
    Group { members: Vec<String> },
}

impl AddressKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Subnet { .. } => "subnet",
            Self::Range { .. } => "range",
            Self::Fqdn { .. } => "fqdn",
            Self::Group { .. } => "group",
        }
    }
}

/// Named, reusable address definition referenced by policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressObject {
    pub name: String,
    #[serde(flatten)]
    pub kind: AddressKind,
}

impl AddressObject {
    pub fn subnet(name: impl Into<String>, subnet: IpNet) -> Self {
        Self {
            name: name.into(),
            kind: AddressKind::Subnet { subnet },
        }
    }

    pub fn group<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: AddressKind::Group {
                members: members.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Member names if this object is a group.
    pub fn members(&self) -> Option<&[String]> {
        match &self.kind {
            AddressKind::Group { members } => Some(members),
            _ => None,
        }
    }
}
