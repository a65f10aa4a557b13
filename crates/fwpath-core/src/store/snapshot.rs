// ── Immutable reference data snapshot ──
//
// Everything a trace reads, bundled once. Built from a `PolicySource` by
// converting records, dropping the ones that do not convert, and running
// cross-reference checks. Defects become `LoadIssue`s; only a failure to
// list the shared object tables aborts the build.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

use crate::config::EngineOptions;
use crate::convert::policy_from_record;
use crate::error::{CoreError, ResolveError};
use crate::model::{
    AddressObject, AddressRef, FirewallDevice, FirewallPolicy, ServiceObject, ServiceRef, Zone,
    ZoneMatch,
};
use crate::resolve::{AddressResolver, ServiceResolver};
use crate::source::{PolicyRecord, PolicySource};
use crate::topology::{RouteHop, ZoneRoute, ZoneTopology};
use crate::tracer::PathTracer;

// ── Load issues ──────────────────────────────────────────────────

/// Category of a reference-data defect found while building a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueKind {
    InvalidRecord,
    DuplicateName,
    CyclicGroup,
    UnknownReference,
    DuplicateOrder,
    UnknownFirewall,
    PoliciesUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    pub kind: IssueKind,
    /// What the issue is about, e.g. `address object lan` or `policy FW-01/7`.
    pub subject: String,
    pub message: String,
}

impl LoadIssue {
    fn new(kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

impl From<&ResolveError> for IssueKind {
    fn from(err: &ResolveError) -> Self {
        match err {
            ResolveError::CyclicGroup { .. } => Self::CyclicGroup,
            ResolveError::InvalidLiteral { .. } => Self::InvalidRecord,
            ResolveError::UnknownAddressObject { .. } | ResolveError::UnknownServiceObject { .. } => {
                Self::UnknownReference
            }
        }
    }
}

/// Collects issues and logs each one as it is found.
#[derive(Default)]
struct IssueLog {
    issues: Vec<LoadIssue>,
}

impl IssueLog {
    fn push(&mut self, kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) {
        let issue = LoadIssue::new(kind, subject, message);
        warn!(kind = %issue.kind, subject = %issue.subject, "{}", issue.message);
        self.issues.push(issue);
    }
}

// ── Policy lists ─────────────────────────────────────────────────

/// A firewall's policy list, or why it could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyList {
    Loaded(Vec<FirewallPolicy>),
    Unavailable { reason: String },
}

impl PolicyList {
    /// All policies (disabled included) in evaluation order.
    pub fn in_evaluation_order(&self) -> Vec<&FirewallPolicy> {
        match self {
            Self::Loaded(policies) => {
                let mut ordered: Vec<&FirewallPolicy> = policies.iter().collect();
                ordered.sort_by_key(|p| p.order);
                ordered
            }
            Self::Unavailable { .. } => Vec::new(),
        }
    }
}

// ── Snapshot ─────────────────────────────────────────────────────

/// Immutable bundle of reference data a trace runs against.
#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: u64,
    loaded_at: DateTime<Utc>,
    options: EngineOptions,
    addresses: AddressResolver,
    services: ServiceResolver,
    topology: ZoneTopology,
    policies: IndexMap<String, PolicyList>,
    issues: Vec<LoadIssue>,
}

impl Snapshot {
    /// Read everything from `source` and build a snapshot.
    ///
    /// Fails only when one of the shared tables (addresses, services,
    /// zones, firewalls, routes) cannot be listed. A failing policy list
    /// marks that firewall unavailable instead.
    pub fn build(source: &dyn PolicySource, options: EngineOptions) -> Result<Self, CoreError> {
        let mut log = IssueLog::default();

        let address_objects = convert_all(
            "address object",
            source.list_address_objects()?,
            |r| r.name.clone(),
            AddressObject::try_from,
            &mut log,
        );
        let address_objects = dedupe(address_objects, "address object", |a| a.name.clone(), &mut log);

        let service_objects = convert_all(
            "service object",
            source.list_service_objects()?,
            |r| r.name.clone(),
            ServiceObject::try_from,
            &mut log,
        );
        let service_objects = dedupe(service_objects, "service object", |s| s.name.clone(), &mut log);

        let zones = convert_all("zone", source.list_zones()?, |r| r.name.clone(), Zone::try_from, &mut log);
        let zones = dedupe(zones, "zone", |z| z.name.to_ascii_lowercase(), &mut log);

        let firewalls = convert_all(
            "firewall",
            source.list_firewalls()?,
            |r| r.id.clone(),
            FirewallDevice::try_from,
            &mut log,
        );
        let firewalls = dedupe(firewalls, "firewall", |f| f.id.clone(), &mut log);

        let routes: Vec<ZoneRoute> = source.list_routes()?.into_iter().map(ZoneRoute::from).collect();

        let addresses = AddressResolver::new(address_objects);
        let services = ServiceResolver::new(service_objects);

        for (name, err) in addresses.broken_groups() {
            log.push(IssueKind::from(&err), format!("address object {name}"), err.to_string());
        }
        let topology = ZoneTopology::new(zones, firewalls, routes, &options.topology);
        check_topology(&topology, &mut log);

        let mut policies = IndexMap::new();
        for firewall in topology.firewalls() {
            let list = match source.list_policies(&firewall.id) {
                Ok(records) => {
                    let loaded = load_policies(&firewall.id, records, &mut log);
                    check_policy_references(&firewall.id, &loaded, &addresses, &services, &topology, &mut log);
                    PolicyList::Loaded(loaded)
                }
                Err(err) => {
                    log.push(
                        IssueKind::PoliciesUnavailable,
                        format!("firewall {}", firewall.id),
                        err.to_string(),
                    );
                    PolicyList::Unavailable {
                        reason: err.to_string(),
                    }
                }
            };
            policies.insert(firewall.id.clone(), list);
        }

        let snapshot = Self {
            generation: 0,
            loaded_at: Utc::now(),
            options,
            addresses,
            services,
            topology,
            policies,
            issues: log.issues,
        };
        info!(
            address_objects = snapshot.addresses.len(),
            service_objects = snapshot.services.len(),
            zones = snapshot.topology.zones().len(),
            firewalls = snapshot.topology.firewalls().len(),
            issues = snapshot.issues.len(),
            "snapshot built"
        );
        Ok(snapshot)
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Tracer bound to this snapshot.
    pub fn tracer(&self) -> PathTracer<'_> {
        PathTracer::new(self)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn addresses(&self) -> &AddressResolver {
        &self.addresses
    }

    pub fn services(&self) -> &ServiceResolver {
        &self.services
    }

    pub fn topology(&self) -> &ZoneTopology {
        &self.topology
    }

    /// Policy list of a registered firewall.
    pub fn policies(&self, firewall_id: &str) -> Option<&PolicyList> {
        self.policies.get(firewall_id)
    }

    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }
}

// ── Build helpers ────────────────────────────────────────────────

fn convert_all<R, T>(
    label: &str,
    records: Vec<R>,
    subject: impl Fn(&R) -> String,
    convert: impl Fn(R) -> Result<T, String>,
    log: &mut IssueLog,
) -> Vec<T> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let name = subject(&record);
        match convert(record) {
            Ok(item) => out.push(item),
            Err(reason) => log.push(IssueKind::InvalidRecord, format!("{label} {name}"), reason),
        }
    }
    out
}

/// Keep the first item per key; later duplicates are dropped and reported.
fn dedupe<T>(items: Vec<T>, label: &str, key: impl Fn(&T) -> String, log: &mut IssueLog) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let k = key(&item);
        if seen.insert(k.clone()) {
            out.push(item);
        } else {
            log.push(
                IssueKind::DuplicateName,
                format!("{label} {k}"),
                "duplicate definition ignored; the first one is used",
            );
        }
    }
    out
}

fn check_topology(topology: &ZoneTopology, log: &mut IssueLog) {
    let registered = |id: &str| topology.firewall(id).is_some();
    let known_zone =
        |name: &str| topology.zone(name).is_some() || topology.external_zone().is_named(name);

    for zone in topology.zones() {
        if let Some(owner) = zone.owning_firewall.as_deref().filter(|id| !registered(id)) {
            log.push(
                IssueKind::UnknownFirewall,
                format!("zone {}", zone.name),
                format!("owning firewall '{owner}' is not registered"),
            );
        }
    }
    for fw in topology.firewalls() {
        for name in fw.zones.iter().filter(|n| !known_zone(n)) {
            log.push(
                IssueKind::UnknownReference,
                format!("firewall {}", fw.id),
                format!("declares unknown zone '{name}'"),
            );
        }
    }
    for route in topology.routes().routes() {
        for hop in &route.hops {
            if let RouteHop::Firewall(id) = hop {
                if !registered(id) {
                    log.push(
                        IssueKind::UnknownFirewall,
                        format!("route {}->{}", route.from, route.to),
                        format!("firewall '{id}' is not registered"),
                    );
                }
            }
        }
    }
}

fn load_policies(firewall_id: &str, records: Vec<PolicyRecord>, log: &mut IssueLog) -> Vec<FirewallPolicy> {
    let mut policies: Vec<FirewallPolicy> = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let subject = match &record.id {
            Some(id) => format!("policy {firewall_id}/{id}"),
            None => format!("policy {firewall_id}/#{}", index + 1),
        };
        match policy_from_record(record, index + 1) {
            Ok(policy) => {
                if let Some(clash) = policies.iter().find(|p| p.order == policy.order) {
                    log.push(
                        IssueKind::DuplicateOrder,
                        subject,
                        format!("order {} is also used by policy {}", policy.order, clash.id),
                    );
                }
                policies.push(policy);
            }
            Err(reason) => log.push(IssueKind::InvalidRecord, subject, reason),
        }
    }
    policies
}

fn check_policy_references(
    firewall_id: &str,
    policies: &[FirewallPolicy],
    addresses: &AddressResolver,
    services: &ServiceResolver,
    topology: &ZoneTopology,
    log: &mut IssueLog,
) {
    let known_zone =
        |name: &str| topology.zone(name).is_some() || topology.external_zone().is_named(name);

    for policy in policies {
        let subject = || format!("policy {firewall_id}/{}", policy.id);

        for zones in [&policy.src_zones, &policy.dst_zones] {
            if let ZoneMatch::Zones(names) = zones {
                for name in names.iter().filter(|n| !known_zone(n)) {
                    log.push(IssueKind::UnknownReference, subject(), format!("unknown zone '{name}'"));
                }
            }
        }
        for addr in policy.src_addrs.iter().chain(&policy.dst_addrs) {
            if let AddressRef::Named(name) = addr {
                if let Err(err) = addresses.resolve(name) {
                    log.push(IssueKind::from(&err), subject(), err.to_string());
                }
            }
        }
        for svc in &policy.services {
            if let ServiceRef::Named(name) = svc {
                if let Err(err) = services.resolve(name) {
                    log.push(IssueKind::from(&err), subject(), err.to_string());
                }
            }
        }
    }
}
