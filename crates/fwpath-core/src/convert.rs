// ── Record-to-domain conversions ──
//
// Turns loose `source::records` into canonical `model` types. Each
// conversion normalizes field names, parses strings into strong types and
// fills defaults for missing optional data. A record that cannot be made
// sense of is rejected with a one-line reason; the snapshot loader turns
// that into a load issue and carries on.

use std::net::{IpAddr, Ipv4Addr};

use ipnet::IpNet;

use crate::model::{
    AddressKind, AddressObject, AddressRef, FirewallDevice, FirewallPolicy, PolicyAction,
    PortRange, ServiceObject, ServiceProtocol, ServiceRef, Zone, ZoneMatch,
};
use crate::resolve::service::parse_port_ranges;
use crate::source::{
    AddressRecord, FirewallRecord, OneOrMany, PolicyRecord, PortSpec, RouteRecord, ServiceRecord,
    ZoneRecord,
};
use crate::topology::{RouteHop, ZoneRoute};

// ── Helpers ────────────────────────────────────────────────────────

fn required_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("missing name".into());
    }
    Ok(name.to_owned())
}

/// Parse `10.0.0.0/8`, a bare host address, or the FortiOS
/// `10.0.0.0 255.0.0.0` address/netmask form. Host bits are cleared.
pub(crate) fn parse_network(raw: &str) -> Result<IpNet, String> {
    let raw = raw.trim();
    if let Ok(net) = raw.parse::<IpNet>() {
        return Ok(net.trunc());
    }
    if let Ok(ip) = raw.parse::<IpAddr>() {
        let max = if ip.is_ipv4() { 32 } else { 128 };
        return IpNet::new(ip, max).map_err(|e| e.to_string());
    }
    if let Some((addr, mask)) = raw.split_once(char::is_whitespace) {
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("'{raw}' is not a network"))?;
        let mask: Ipv4Addr = mask
            .trim()
            .parse()
            .map_err(|_| format!("'{raw}' is not a network"))?;
        let prefix = ipnet::ipv4_mask_to_prefix(mask)
            .map_err(|_| format!("'{mask}' is not a contiguous netmask"))?;
        return IpNet::new(IpAddr::V4(addr), prefix)
            .map(|net| net.trunc())
            .map_err(|e| e.to_string());
    }
    Err(format!("'{raw}' is not a network"))
}

fn parse_ip(field: &str, raw: Option<&String>) -> Result<IpAddr, String> {
    let raw = raw.ok_or_else(|| format!("missing {field}"))?;
    raw.trim()
        .parse()
        .map_err(|_| format!("{field} '{raw}' is not an IP address"))
}

fn port_number(n: u64) -> Result<u16, String> {
    u16::try_from(n).map_err(|_| format!("port {n} is out of range"))
}

fn port_ranges(spec: &PortSpec) -> Result<Vec<PortRange>, String> {
    match spec {
        PortSpec::Number(n) => Ok(vec![PortRange::single(port_number(*n)?)]),
        PortSpec::Text(text) => parse_port_ranges(text),
        PortSpec::Pair(bounds) => match bounds.as_slice() {
            [low, high] => {
                let (low, high) = (port_number(*low)?, port_number(*high)?);
                PortRange::new(low, high)
                    .map(|r| vec![r])
                    .ok_or_else(|| format!("port range {low}-{high} is inverted"))
            }
            other => Err(format!(
                "port pair must have two bounds, got {}",
                other.len()
            )),
        },
    }
}

fn names(field: Option<OneOrMany>) -> Vec<String> {
    field
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_action(raw: &str) -> Result<PolicyAction, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "accept" | "allow" | "permit" => Ok(PolicyAction::Accept),
        "deny" | "drop" | "block" | "reject" => Ok(PolicyAction::Deny),
        other => Err(format!("unknown action '{other}'")),
    }
}

// ─── Address objects ─────────────────────────────────────────────

impl TryFrom<AddressRecord> for AddressObject {
    type Error = String;

    fn try_from(rec: AddressRecord) -> Result<Self, String> {
        let name = required_name(&rec.name)?;
        let kind = match rec.kind.as_deref().map(str::to_ascii_lowercase) {
            Some(kind) => kind,
            None if rec.subnet.is_some() => "subnet".into(),
            None if rec.start.is_some() || rec.end.is_some() => "range".into(),
            None if rec.fqdn.is_some() => "fqdn".into(),
            None if !rec.members.is_empty() => "group".into(),
            None => return Err("cannot infer address type".into()),
        };

        let kind = match kind.as_str() {
            "subnet" | "ipmask" => {
                let raw = rec.subnet.ok_or("subnet object without 'subnet'")?;
                AddressKind::Subnet {
                    subnet: parse_network(&raw)?,
                }
            }
            "range" | "iprange" => {
                let start = parse_ip("start", rec.start.as_ref())?;
                let end = parse_ip("end", rec.end.as_ref())?;
                if start.is_ipv4() != end.is_ipv4() {
                    return Err("range mixes address families".into());
                }
                if start > end {
                    return Err(format!("range start {start} is after end {end}"));
                }
                AddressKind::Range { start, end }
            }
            "fqdn" => {
                let fqdn = rec
                    .fqdn
                    .map(|f| f.trim().to_owned())
                    .filter(|f| !f.is_empty())
                    .ok_or("fqdn object without 'fqdn'")?;
                AddressKind::Fqdn { fqdn }
            }
            "group" | "addrgrp" => {
                let members: Vec<String> = rec
                    .members
                    .into_iter()
                    .map(|m| m.trim().to_owned())
                    .filter(|m| !m.is_empty())
                    .collect();
                if members.is_empty() {
                    return Err("group has no members".into());
                }
                AddressKind::Group { members }
            }
            other => return Err(format!("unsupported address type '{other}'")),
        };

        Ok(Self { name, kind })
    }
}

// ─── Service objects ─────────────────────────────────────────────

impl TryFrom<ServiceRecord> for ServiceObject {
    type Error = String;

    fn try_from(rec: ServiceRecord) -> Result<Self, String> {
        let name = required_name(&rec.name)?;
        let protocol = match rec.protocol.as_deref().map(str::trim) {
            Some(raw) => raw
                .parse::<ServiceProtocol>()
                .map_err(|_| format!("unknown protocol '{raw}'"))?,
            None if !rec.ports.is_empty() => ServiceProtocol::Tcp,
            None => return Err("missing protocol".into()),
        };

        let mut ranges = Vec::new();
        for spec in &rec.ports {
            ranges.extend(port_ranges(spec)?);
        }
        if protocol.has_ports() && ranges.is_empty() {
            return Err(format!("{protocol} service has no port ranges"));
        }
        if !protocol.has_ports() {
            ranges.clear();
        }

        Ok(Self::new(name, protocol, ranges))
    }
}

// ─── Zones / firewalls / routes ──────────────────────────────────

impl TryFrom<ZoneRecord> for Zone {
    type Error = String;

    fn try_from(rec: ZoneRecord) -> Result<Self, String> {
        let name = required_name(&rec.name)?;
        let networks = rec
            .networks
            .iter()
            .map(|n| parse_network(n))
            .collect::<Result<Vec<_>, _>>()?;
        let mut zone = Zone::new(name, networks);
        zone.owning_firewall = rec
            .firewall
            .map(|f| f.trim().to_owned())
            .filter(|f| !f.is_empty());
        Ok(zone)
    }
}

impl TryFrom<FirewallRecord> for FirewallDevice {
    type Error = String;

    fn try_from(rec: FirewallRecord) -> Result<Self, String> {
        let id = rec.id.trim().to_owned();
        if id.is_empty() {
            return Err("missing id".into());
        }
        let name = rec
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.clone());
        let mut device = FirewallDevice::new(id, name);
        device.zones = rec.zones.into_iter().map(|z| z.trim().to_owned()).collect();
        Ok(device)
    }
}

impl From<RouteRecord> for ZoneRoute {
    fn from(rec: RouteRecord) -> Self {
        let hops = rec
            .firewalls
            .into_iter()
            .map(|id| RouteHop::Firewall(id.trim().to_owned()))
            .collect();
        ZoneRoute::new(rec.from.trim(), rec.to.trim(), hops)
    }
}

// ─── Policies ────────────────────────────────────────────────────

/// Convert a policy record. `position` is the record's 1-based index in its
/// list and stands in for a missing `order`.
pub fn policy_from_record(rec: PolicyRecord, position: usize) -> Result<FirewallPolicy, String> {
    let id = rec
        .id
        .map(|id| id.to_string().trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or("missing id")?;
    let action = parse_action(rec.action.as_deref().ok_or("missing action")?)?;
    let order = match rec.order {
        Some(order) => order,
        None => i64::try_from(position).map_err(|_| "policy list too long".to_owned())?,
    };

    let addr_refs = |field| -> Vec<AddressRef> {
        let refs: Vec<AddressRef> = names(field).iter().map(|n| AddressRef::parse(n)).collect();
        if refs.is_empty() { vec![AddressRef::All] } else { refs }
    };
    let src_addrs = addr_refs(rec.src_addrs);
    let dst_addrs = addr_refs(rec.dst_addrs);

    let mut services: Vec<ServiceRef> = names(rec.services)
        .iter()
        .map(|n| ServiceRef::parse(n))
        .collect();
    if services.is_empty() {
        services.push(ServiceRef::All);
    }

    Ok(FirewallPolicy {
        id,
        name: rec.name.filter(|n| !n.trim().is_empty()),
        order,
        enabled: rec.enabled.unwrap_or(true),
        action,
        src_zones: ZoneMatch::from_names(names(rec.src_zones)),
        dst_zones: ZoneMatch::from_names(names(rec.dst_zones)),
        src_addrs,
        dst_addrs,
        services,
        nat: rec.nat.unwrap_or(false),
    })
}
