// ── Service object resolution ──

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::model::policy::is_wildcard;
use crate::model::{PortRange, ServiceObject, ServiceProtocol, ServiceRef};

/// Read-only table of service objects, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ServiceResolver {
    objects: IndexMap<String, ServiceObject>,
}

impl ServiceResolver {
    /// Build from objects in registration order; first name wins.
    pub fn new(objects: impl IntoIterator<Item = ServiceObject>) -> Self {
        let mut table = IndexMap::new();
        for obj in objects {
            table.entry(obj.name.clone()).or_insert(obj);
        }
        Self { objects: table }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceObject> {
        self.objects.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Resolve a registered service name or a literal.
    ///
    /// `ALL` / `any` map to the unrestricted service. Literals of the form
    /// `tcp/443`, `udp/53`, `tcp/8000-8080,8443` and bare `icmp` are also
    /// accepted. Names are matched exactly first, then ASCII
    /// case-insensitively.
    pub fn resolve(&self, name_or_literal: &str) -> Result<Cow<'_, ServiceObject>, ResolveError> {
        let name = name_or_literal.trim();
        if is_wildcard(name) {
            return Ok(Cow::Owned(ServiceObject::all()));
        }
        if let Some(obj) = self.objects.get(name).or_else(|| {
            self.objects
                .values()
                .find(|obj| obj.name.eq_ignore_ascii_case(name))
        }) {
            return Ok(Cow::Borrowed(obj));
        }
        parse_literal(name).map(Cow::Owned)
    }

    pub fn resolve_ref(&self, reference: &ServiceRef) -> Result<Cow<'_, ServiceObject>, ResolveError> {
        match reference {
            ServiceRef::All => Ok(Cow::Owned(ServiceObject::all())),
            ServiceRef::Named(name) => self.resolve(name),
        }
    }

    /// Whether `svc` admits a connection with this protocol and destination port.
    pub fn matches(svc: &ServiceObject, protocol: &str, port: u16) -> bool {
        match svc.protocol {
            ServiceProtocol::Any => true,
            proto => {
                if !protocol.eq_ignore_ascii_case(&proto.to_string()) {
                    return false;
                }
                !proto.has_ports() || svc.port_ranges.iter().any(|r| r.contains(port))
            }
        }
    }
}

/// Parse a comma/space separated port list: `80`, `80-443`, `80,443 8080`.
pub(crate) fn parse_port_ranges(raw: &str) -> Result<Vec<PortRange>, String> {
    raw.split([',', ' '])
        .filter(|part| !part.is_empty())
        .map(parse_port_range)
        .collect()
}

pub(crate) fn parse_port_range(raw: &str) -> Result<PortRange, String> {
    let parse = |p: &str| {
        p.trim()
            .parse::<u16>()
            .map_err(|_| format!("'{p}' is not a port number"))
    };
    match raw.split_once('-') {
        Some((low, high)) => {
            let (low, high) = (parse(low)?, parse(high)?);
            PortRange::new(low, high).ok_or_else(|| format!("port range {low}-{high} is inverted"))
        }
        None => parse(raw).map(PortRange::single),
    }
}

fn parse_literal(raw: &str) -> Result<ServiceObject, ResolveError> {
    let unknown = || ResolveError::UnknownServiceObject {
        name: raw.to_owned(),
    };
    let (proto, ports) = match raw.split_once('/') {
        Some((proto, ports)) => (proto, Some(ports)),
        None => (raw, None),
    };
    let protocol: ServiceProtocol = proto.parse().map_err(|_| unknown())?;

    let port_ranges = match ports {
        Some(ports) => parse_port_ranges(ports).map_err(|reason| ResolveError::InvalidLiteral {
            kind: "service",
            value: raw.to_owned(),
            reason,
        })?,
        None if protocol.has_ports() => return Err(unknown()),
        None => Vec::new(),
    };

    Ok(ServiceObject::new(raw, protocol, port_ranges))
}
