// ── Service objects ──

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

/// Protocol a service object is defined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServiceProtocol {
    Tcp,
    Udp,
    Icmp,
    #[strum(to_string = "any", serialize = "all", serialize = "ip")]
    Any,
}

impl ServiceProtocol {
    /// Whether services of this protocol constrain the destination port.
    pub fn has_ports(self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

/// Inclusive destination port range. Construction enforces `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PortRange {
    low: u16,
    high: u16,
}

impl PortRange {
    pub fn new(low: u16, high: u16) -> Option<Self> {
        (low <= high).then_some(Self { low, high })
    }

    pub fn single(port: u16) -> Self {
        Self {
            low: port,
            high: port,
        }
    }

    pub fn low(self) -> u16 {
        self.low
    }

    pub fn high(self) -> u16 {
        self.high
    }

    pub fn contains(self, port: u16) -> bool {
        (self.low..=self.high).contains(&port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// Named protocol + port-range definition referenced by policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceObject {
    pub name: String,
    pub protocol: ServiceProtocol,
    pub port_ranges: Vec<PortRange>,
}

impl ServiceObject {
    /// The unrestricted service (`ALL` / `any`).
    pub fn all() -> Self {
        Self {
            name: "ALL".into(),
            protocol: ServiceProtocol::Any,
            port_ranges: Vec::new(),
        }
    }

    pub fn new(
        name: impl Into<String>,
        protocol: ServiceProtocol,
        port_ranges: Vec<PortRange>,
    ) -> Self {
        Self {
            name: name.into(),
            protocol,
            port_ranges,
        }
    }

    /// Compact `tcp/80-443,8080` style summary.
    pub fn summary(&self) -> String {
        if !self.protocol.has_ports() || self.port_ranges.is_empty() {
            return self.protocol.to_string();
        }
        let ports = self
            .port_ranges
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}/{ports}", self.protocol)
    }
}
