// ── Zone topology ──
//
// Maps addresses to zones, zones to owning firewalls, and zone pairs to
// the ordered chain of firewalls a packet crosses. Chains come from a
// small table of operator-known routes, not from graph search; everything
// path-shaped goes through `firewall_chain` so the table can be replaced
// without touching evaluation.

use std::net::IpAddr;

use tracing::debug;

use crate::config::TopologyOptions;
use crate::model::{FirewallDevice, Zone};

/// Firewall ID used when nothing is registered at all.
pub const DEFAULT_FIREWALL_ID: &str = "default";

/// One position in a zone-pair route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteHop {
    /// The firewall owning the source zone.
    SourceOwner,
    /// The firewall owning the destination zone.
    DestinationOwner,
    /// A specific firewall.
    Firewall(String),
}

/// Ordered hop list for traffic from zone `from` to zone `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRoute {
    pub from: String,
    pub to: String,
    pub hops: Vec<RouteHop>,
}

impl ZoneRoute {
    pub fn new(from: impl Into<String>, to: impl Into<String>, hops: Vec<RouteHop>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            hops,
        }
    }

    fn connects(&self, from: &str, to: &str) -> bool {
        self.from.eq_ignore_ascii_case(from) && self.to.eq_ignore_ascii_case(to)
    }
}

/// Zone-pair lookup table. Operator routes are consulted before the
/// built-in ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<ZoneRoute>,
}

impl RouteTable {
    /// Built-in routes: internal→external, external→dmz, internal→dmz and
    /// branch→internal, each crossing the source zone's firewall and then
    /// the destination zone's.
    pub fn builtin(external_zone: &str) -> Self {
        let edge = || vec![RouteHop::SourceOwner, RouteHop::DestinationOwner];
        Self {
            routes: vec![
                ZoneRoute::new("internal", external_zone, edge()),
                ZoneRoute::new(external_zone, "dmz", edge()),
                ZoneRoute::new("internal", "dmz", edge()),
                ZoneRoute::new("branch", "internal", edge()),
            ],
        }
    }

    pub fn with_operator_routes(mut self, operator: Vec<ZoneRoute>) -> Self {
        let builtin = std::mem::take(&mut self.routes);
        self.routes = operator;
        self.routes.extend(builtin);
        self
    }

    pub fn lookup(&self, from: &str, to: &str) -> Option<&ZoneRoute> {
        self.routes.iter().find(|r| r.connects(from, to))
    }

    pub fn routes(&self) -> &[ZoneRoute] {
        &self.routes
    }
}

/// Read-only zone and firewall layout shared by all traces.
#[derive(Debug, Clone)]
pub struct ZoneTopology {
    zones: Vec<Zone>,
    firewalls: Vec<FirewallDevice>,
    external: Zone,
    routes: RouteTable,
    fallback_firewall: String,
}

impl ZoneTopology {
    pub fn new(
        zones: Vec<Zone>,
        firewalls: Vec<FirewallDevice>,
        operator_routes: Vec<ZoneRoute>,
        options: &TopologyOptions,
    ) -> Self {
        // A registered zone carrying the external name lends its owner to
        // the fallback zone.
        let external = zones
            .iter()
            .find(|z| z.is_named(&options.external_zone))
            .cloned()
            .unwrap_or_else(|| Zone::new(options.external_zone.clone(), Vec::new()));

        let fallback_firewall = options
            .fallback_firewall
            .clone()
            .or_else(|| firewalls.first().map(|fw| fw.id.clone()))
            .unwrap_or_else(|| DEFAULT_FIREWALL_ID.into());

        Self {
            zones,
            firewalls,
            external,
            routes: RouteTable::builtin(&options.external_zone).with_operator_routes(operator_routes),
            fallback_firewall,
        }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn firewalls(&self) -> &[FirewallDevice] {
        &self.firewalls
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn external_zone(&self) -> &Zone {
        &self.external
    }

    pub fn fallback_firewall(&self) -> &str {
        &self.fallback_firewall
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.is_named(name))
    }

    pub fn firewall(&self, id: &str) -> Option<&FirewallDevice> {
        self.firewalls.iter().find(|fw| fw.id == id)
    }

    /// First registered zone containing `ip`, else the external zone.
    /// Registration order decides overlaps, not prefix length.
    pub fn zone_for_ip(&self, ip: IpAddr) -> &Zone {
        self.zones
            .iter()
            .find(|z| z.contains(ip))
            .unwrap_or(&self.external)
    }

    /// Owning firewall of a zone: its declared owner, else the first
    /// registered firewall listing it.
    pub fn owner_of<'a>(&'a self, zone: &'a Zone) -> Option<&'a str> {
        zone.owning_firewall.as_deref().or_else(|| {
            self.firewalls
                .iter()
                .find(|fw| fw.declares_zone(&zone.name))
                .map(|fw| fw.id.as_str())
        })
    }

    /// Ordered firewalls a packet crosses from `src` to `dst`. Never empty.
    pub fn firewall_chain(&self, src: &Zone, dst: &Zone) -> Vec<String> {
        let src_owner = self.owner_of(src);
        let dst_owner = self.owner_of(dst);

        let (via, chain): (&str, Vec<String>) = if src.is_named(&dst.name) {
            ("same-zone", src_owner.into_iter().map(str::to_owned).collect())
        } else if let Some(route) = self.routes.lookup(&src.name, &dst.name) {
            let hops = route.hops.iter().filter_map(|hop| match hop {
                RouteHop::SourceOwner => src_owner.map(str::to_owned),
                RouteHop::DestinationOwner => dst_owner.map(str::to_owned),
                RouteHop::Firewall(id) => Some(id.clone()),
            });
            ("route", dedup_in_order(hops))
        } else {
            ("union", self.owner_union(src_owner, dst_owner))
        };

        let (via, chain) = if chain.is_empty() {
            ("fallback", vec![self.fallback_firewall.clone()])
        } else {
            (via, chain)
        };

        debug!(src_zone = %src.name, dst_zone = %dst.name, via, chain = ?chain, "firewall chain");
        chain
    }

    /// Owners of either zone, registered firewalls first in registration
    /// order, then any unregistered owner IDs.
    fn owner_union(&self, src_owner: Option<&str>, dst_owner: Option<&str>) -> Vec<String> {
        let owners: Vec<&str> = src_owner.into_iter().chain(dst_owner).collect();
        let registered = self
            .firewalls
            .iter()
            .filter(|fw| owners.contains(&fw.id.as_str()))
            .map(|fw| fw.id.clone());
        let unregistered = owners
            .iter()
            .filter(|id| self.firewall(id).is_none())
            .map(|id| (*id).to_owned());
        dedup_in_order(registered.chain(unregistered))
    }
}

fn dedup_in_order(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn zone(name: &str, cidr: &str, owner: &str) -> Zone {
        Zone::new(name, vec![cidr.parse().unwrap()]).owned_by(owner)
    }

    fn firewall(id: &str, zones: &[&str]) -> FirewallDevice {
        let mut fw = FirewallDevice::new(id, format!("{id} gateway"));
        fw.zones = zones.iter().map(|z| (*z).to_owned()).collect();
        fw
    }

    fn topology() -> ZoneTopology {
        ZoneTopology::new(
            vec![
                zone("internal", "192.168.0.0/16", "FW-01"),
                zone("dmz", "172.16.0.0/12", "FW-02"),
                zone("branch", "10.50.0.0/16", "FW-03"),
                zone("lab", "192.168.99.0/24", "FW-02"),
            ],
            vec![
                firewall("FW-01", &["internal"]),
                firewall("FW-02", &["dmz", "lab"]),
                firewall("FW-03", &["branch"]),
            ],
            Vec::new(),
            &TopologyOptions::default(),
        )
    }

    #[test]
    fn first_registered_zone_wins() {
        let topo = topology();
        // 192.168.99.5 is in both internal (/16) and lab (/24); internal was
        // registered first.
        assert_eq!(topo.zone_for_ip(ip("192.168.99.5")).name, "internal");
        assert_eq!(topo.zone_for_ip(ip("172.16.4.4")).name, "dmz");
    }

    #[test]
    fn unmatched_ip_is_external() {
        let topo = topology();
        let z = topo.zone_for_ip(ip("8.8.8.8"));
        assert_eq!(z.name, "external");
        assert!(z.owning_firewall.is_none());
    }

    #[test]
    fn registered_external_zone_is_reused_as_fallback() {
        let topo = ZoneTopology::new(
            vec![zone("external", "100.64.0.0/10", "FW-EDGE")],
            vec![firewall("FW-EDGE", &["external"])],
            Vec::new(),
            &TopologyOptions::default(),
        );
        let z = topo.zone_for_ip(ip("8.8.8.8"));
        assert_eq!(z.owning_firewall.as_deref(), Some("FW-EDGE"));
    }

    #[test]
    fn internal_to_external_crosses_source_firewall() {
        let topo = topology();
        let src = topo.zone("internal").unwrap();
        let chain = topo.firewall_chain(src, topo.external_zone());
        assert_eq!(chain, vec!["FW-01"]);
    }

    #[test]
    fn internal_to_dmz_crosses_both_firewalls() {
        let topo = topology();
        let chain = topo.firewall_chain(topo.zone("internal").unwrap(), topo.zone("dmz").unwrap());
        assert_eq!(chain, vec!["FW-01", "FW-02"]);
    }

    #[test]
    fn branch_to_internal_follows_route_order() {
        let topo = topology();
        let chain = topo.firewall_chain(topo.zone("branch").unwrap(), topo.zone("internal").unwrap());
        assert_eq!(chain, vec!["FW-03", "FW-01"]);
    }

    #[test]
    fn unlisted_pair_uses_registration_order_union() {
        let topo = topology();
        // dmz -> internal has no table entry; FW-01 was registered first.
        let chain = topo.firewall_chain(topo.zone("dmz").unwrap(), topo.zone("internal").unwrap());
        assert_eq!(chain, vec!["FW-01", "FW-02"]);
    }

    #[test]
    fn same_zone_is_single_owner() {
        let topo = topology();
        let dmz = topo.zone("dmz").unwrap();
        assert_eq!(topo.firewall_chain(dmz, dmz), vec!["FW-02"]);
    }

    #[test]
    fn same_owner_different_zones_collapses() {
        let topo = topology();
        let chain = topo.firewall_chain(topo.zone("dmz").unwrap(), topo.zone("lab").unwrap());
        assert_eq!(chain, vec!["FW-02"]);
    }

    #[test]
    fn unowned_zones_fall_back_to_first_firewall() {
        let topo = topology();
        let ext = topo.external_zone();
        assert_eq!(topo.firewall_chain(ext, ext), vec!["FW-01"]);
    }

    #[test]
    fn configured_fallback_firewall_wins() {
        let options = TopologyOptions {
            fallback_firewall: Some("FW-EDGE".into()),
            ..TopologyOptions::default()
        };
        let topo = ZoneTopology::new(Vec::new(), Vec::new(), Vec::new(), &options);
        let ext = topo.external_zone();
        assert_eq!(topo.firewall_chain(ext, ext), vec!["FW-EDGE"]);
    }

    #[test]
    fn empty_topology_uses_default_id() {
        let topo = ZoneTopology::new(Vec::new(), Vec::new(), Vec::new(), &TopologyOptions::default());
        let ext = topo.external_zone();
        assert_eq!(topo.firewall_chain(ext, ext), vec![DEFAULT_FIREWALL_ID]);
    }

    #[test]
    fn operator_route_overrides_builtin() {
        let topo = ZoneTopology::new(
            vec![
                zone("internal", "192.168.0.0/16", "FW-01"),
                zone("dmz", "172.16.0.0/12", "FW-02"),
            ],
            vec![firewall("FW-01", &[]), firewall("FW-02", &[]), firewall("FW-CORE", &[])],
            vec![ZoneRoute::new(
                "Internal",
                "DMZ",
                vec![
                    RouteHop::SourceOwner,
                    RouteHop::Firewall("FW-CORE".into()),
                    RouteHop::DestinationOwner,
                ],
            )],
            &TopologyOptions::default(),
        );
        let chain = topo.firewall_chain(topo.zone("internal").unwrap(), topo.zone("dmz").unwrap());
        assert_eq!(chain, vec!["FW-01", "FW-CORE", "FW-02"]);
    }

    #[test]
    fn owner_falls_back_to_declaring_firewall() {
        let topo = ZoneTopology::new(
            vec![Zone::new("guest", vec!["10.77.0.0/16".parse().unwrap()])],
            vec![firewall("FW-01", &[]), firewall("FW-09", &["GUEST"])],
            Vec::new(),
            &TopologyOptions::default(),
        );
        assert_eq!(topo.owner_of(topo.zone("guest").unwrap()), Some("FW-09"));
    }

    #[test]
    fn explicit_owner_comes_from_the_zone_itself() {
        let topo = topology();
        let detached = zone("guest", "10.77.0.0/16", "FW-07");
        assert_eq!(topo.owner_of(&detached), Some("FW-07"));
    }
}
