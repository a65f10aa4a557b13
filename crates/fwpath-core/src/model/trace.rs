// ── Trace request / result types ──
//
// `PathTrace` is the serialized answer handed back to hosts. Extension
// fields are skipped when empty so the common shape stays
// `{allowed, hops, blocked_by, nat_required, src_zone, dst_zone}`.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// A connection as seen by the evaluator. Only the destination port is
/// matched against services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTuple {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    /// Lowercased protocol name (`tcp`, `udp`, `icmp`, ...).
    pub protocol: String,
    pub port: u16,
}

impl ConnectionTuple {
    pub fn new(src_ip: IpAddr, dst_ip: IpAddr, protocol: &str, port: u16) -> Self {
        Self {
            src_ip,
            dst_ip,
            protocol: protocol.trim().to_ascii_lowercase(),
            port,
        }
    }
}

/// Host-facing trace request, as read from batch files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRequest {
    pub src: String,
    pub dst: String,
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "tcp".into()
}

/// Outcome of evaluating one firewall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HopAction {
    Accept,
    Deny,
    NoMatch,
}

impl HopAction {
    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Deny => "deny",
            Self::NoMatch => "no_match",
        }
    }
}

/// Per-firewall detail of a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopResult {
    pub firewall_id: String,
    pub firewall_name: String,
    pub matched_policy_id: Option<String>,
    pub action: HopAction,

    /// Set when this firewall's policy list could not be obtained.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub policies_unavailable: bool,

    /// Reference-data problems hit while evaluating this hop.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Where a blocked trace stopped. `policy_id` is `None` for implicit deny.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedBy {
    pub firewall_id: String,
    pub policy_id: Option<String>,
}

/// Result of tracing one connection through the firewall chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathTrace {
    pub allowed: bool,
    pub hops: Vec<HopResult>,
    pub blocked_by: Option<BlockedBy>,
    pub nat_required: bool,
    pub src_zone: String,
    pub dst_zone: String,
}

impl PathTrace {
    /// The hop that blocked the trace, if any.
    pub fn blocking_hop(&self) -> Option<&HopResult> {
        if self.allowed {
            return None;
        }
        self.hops.last()
    }
}
