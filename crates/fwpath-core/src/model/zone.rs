// ── Zones and firewall devices ──

use std::net::IpAddr;

use ipnet::IpNet;
use serde::Serialize;

/// Security zone -- a named set of networks owned by one firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Zone {
    pub name: String,
    pub networks: Vec<IpNet>,
    pub owning_firewall: Option<String>,
}

impl Zone {
    pub fn new(name: impl Into<String>, networks: Vec<IpNet>) -> Self {
        Self {
            name: name.into(),
            networks,
            owning_firewall: None,
        }
    }

    pub fn owned_by(mut self, firewall_id: impl Into<String>) -> Self {
        self.owning_firewall = Some(firewall_id.into());
        self
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(&ip))
    }

    /// Zone names compare ASCII case-insensitively.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A firewall device and the zones it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallDevice {
    pub id: String,
    pub name: String,
    pub zones: Vec<String>,
}

impl FirewallDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            zones: Vec::new(),
        }
    }

    pub fn declares_zone(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z.eq_ignore_ascii_case(zone))
    }
}
