// ── Address object resolution ──
//
// Turns policy address references into concrete networks. Groups expand
// recursively; the current expansion path doubles as the visited set, so
// `A -> B -> A` fails with `CyclicGroup` while diamonds (two groups sharing
// a member) still resolve.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use indexmap::IndexMap;
use ipnet::{IpNet, Ipv4Subnets, Ipv6Subnets};
use tracing::debug;

use crate::error::ResolveError;
use crate::model::policy::is_wildcard;
use crate::model::{AddressKind, AddressObject, AddressRef};

/// Read-only table of address objects, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    objects: IndexMap<String, AddressObject>,
}

impl AddressResolver {
    /// Build from objects in registration order. A later object with an
    /// already-registered name is ignored.
    pub fn new(objects: impl IntoIterator<Item = AddressObject>) -> Self {
        let mut table = IndexMap::new();
        for obj in objects {
            table.entry(obj.name.clone()).or_insert(obj);
        }
        Self { objects: table }
    }

    /// Look up an object by name: exact match first, then ASCII
    /// case-insensitive, the same as service names.
    pub fn get(&self, name: &str) -> Option<&AddressObject> {
        self.objects.get(name).or_else(|| {
            self.objects
                .values()
                .find(|obj| obj.name.eq_ignore_ascii_case(name))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Resolve a registered object name or an address literal.
    ///
    /// Literals are CIDRs, bare IPs (host prefix), `start-end` ranges and
    /// the `all` / `any` sentinels (every address).
    pub fn resolve(&self, name_or_literal: &str) -> Result<Vec<IpNet>, ResolveError> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.expand_into(name_or_literal.trim(), &mut path, &mut out)?;
        Ok(out)
    }

    pub fn resolve_ref(&self, reference: &AddressRef) -> Result<Vec<IpNet>, ResolveError> {
        match reference {
            AddressRef::All => wildcard_networks(),
            AddressRef::Named(name) => self.resolve(name),
        }
    }

    /// True if any network in `networks` contains `ip`. Plain subnet
    /// containment, not longest-prefix match.
    pub fn contains(networks: &[IpNet], ip: IpAddr) -> bool {
        networks.iter().any(|net| net.contains(&ip))
    }

    /// Resolve every group once and return the ones that fail, in
    /// registration order. Used to report cyclic or dangling groups at load.
    pub fn broken_groups(&self) -> Vec<(String, ResolveError)> {
        self.objects
            .values()
            .filter(|obj| obj.members().is_some())
            .filter_map(|obj| {
                self.resolve(&obj.name)
                    .err()
                    .map(|err| (obj.name.clone(), err))
            })
            .collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn expand_into(
        &self,
        name: &str,
        path: &mut Vec<String>,
        out: &mut Vec<IpNet>,
    ) -> Result<(), ResolveError> {
        let Some(obj) = self.get(name) else {
            out.extend(parse_literal(name)?);
            return Ok(());
        };

        match &obj.kind {
            AddressKind::Subnet { subnet } => out.push(*subnet),
            AddressKind::Range { start, end } => out.extend(range_networks(*start, *end)?),
            AddressKind::Fqdn { fqdn } => {
                // No DNS from inside a trace: FQDN objects never match.
                debug!(object = %obj.name, %fqdn, "fqdn address object resolves to no networks");
            }
            AddressKind::Group { members } => {
                if path.iter().any(|seen| *seen == obj.name) {
                    let mut cycle = path.clone();
                    cycle.push(obj.name.clone());
                    return Err(ResolveError::CyclicGroup {
                        name: path.first().cloned().unwrap_or_else(|| obj.name.clone()),
                        path: cycle.join(" -> "),
                    });
                }
                path.push(obj.name.clone());
                for member in members {
                    self.expand_into(member, path, out)?;
                }
                path.pop();
            }
        }
        Ok(())
    }
}

/// `0.0.0.0/0` and `::/0`.
fn wildcard_networks() -> Result<Vec<IpNet>, ResolveError> {
    Ok(vec![
        prefixed(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)?,
        prefixed(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)?,
    ])
}

fn prefixed(ip: IpAddr, prefix_len: u8) -> Result<IpNet, ResolveError> {
    IpNet::new(ip, prefix_len).map_err(|err| ResolveError::InvalidLiteral {
        kind: "address",
        value: format!("{ip}/{prefix_len}"),
        reason: err.to_string(),
    })
}

fn host_network(ip: IpAddr) -> Result<IpNet, ResolveError> {
    let max = match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    prefixed(ip, max)
}

/// Parse an address literal, or report the name as an unknown object.
pub(crate) fn parse_literal(raw: &str) -> Result<Vec<IpNet>, ResolveError> {
    if is_wildcard(raw) {
        return wildcard_networks();
    }
    if let Ok(net) = raw.parse::<IpNet>() {
        return Ok(vec![net.trunc()]);
    }
    if let Ok(ip) = raw.parse::<IpAddr>() {
        return Ok(vec![host_network(ip)?]);
    }
    if let Some((start, end)) = raw.split_once('-') {
        if let (Ok(start), Ok(end)) = (start.trim().parse(), end.trim().parse()) {
            return range_networks(start, end);
        }
    }
    Err(ResolveError::UnknownAddressObject {
        name: raw.to_owned(),
    })
}

/// Minimal CIDR cover of an inclusive address range.
pub(crate) fn range_networks(start: IpAddr, end: IpAddr) -> Result<Vec<IpNet>, ResolveError> {
    let invalid = |reason: &str| ResolveError::InvalidLiteral {
        kind: "address range",
        value: format!("{start}-{end}"),
        reason: reason.to_owned(),
    };
    if start > end {
        return Err(invalid("start is after end"));
    }
    match (start, end) {
        (IpAddr::V4(s), IpAddr::V4(e)) => Ok(Ipv4Subnets::new(s, e, 0).map(IpNet::V4).collect()),
        (IpAddr::V6(s), IpAddr::V6(e)) => Ok(Ipv6Subnets::new(s, e, 0).map(IpNet::V6).collect()),
        _ => Err(invalid("mixed address families")),
    }
}
