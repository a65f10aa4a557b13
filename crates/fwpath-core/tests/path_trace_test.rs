//! End-to-end path traces against in-memory reference data.
//!
//! Covers first-match ordering, determinism, zone fallback, group-cycle
//! safety, service port boundaries, NAT inference and the three reference
//! topologies (single firewall accept, empty policy list, two-hop block).
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use fwpath_core::{
    AddressResolver, BlockedBy, EngineOptions, HopAction, HopResult, PathTrace, ResolveError,
    Snapshot, SnapshotDocument, SnapshotStore, TraceRequest,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Reference topology: an internal LAN behind FW-01, a DMZ behind FW-02.
/// `policies` replaces the policy map.
fn lab(policies: &Value) -> Snapshot {
    let doc = SnapshotDocument::from_json_value(json!({
        "address_objects": [
            {"name": "lan", "type": "subnet", "subnet": "192.168.1.0/24"},
            {"name": "web-dmz", "type": "range", "start": "172.16.0.10", "end": "172.16.0.20"},
            {"name": "loop-a", "type": "group", "members": ["loop-b"]},
            {"name": "loop-b", "type": "group", "members": ["loop-a"]}
        ],
        "service_objects": [
            {"name": "WEB", "protocol": "tcp", "ports": ["80-443"]},
            {"name": "PING", "protocol": "icmp"},
            {"name": "EVERYTHING", "protocol": "any"}
        ],
        "zones": [
            {"name": "internal", "networks": ["192.168.0.0/16"], "firewall": "FW-01"},
            {"name": "dmz", "networks": ["172.16.0.0/24"], "firewall": "FW-02"}
        ],
        "firewalls": [
            {"id": "FW-01", "name": "edge-01", "zones": ["internal"]},
            {"id": "FW-02", "name": "dmz-02", "zones": ["dmz"]}
        ],
        "policies": policies
    }))
    .unwrap();
    Snapshot::build(&doc, EngineOptions::default()).unwrap()
}

fn trace(snapshot: &Snapshot, src: &str, dst: &str, port: u16, protocol: &str) -> PathTrace {
    snapshot.tracer().trace(src, dst, port, protocol).unwrap()
}

fn hop(id: &str, name: &str, policy: Option<&str>, action: HopAction) -> HopResult {
    HopResult {
        firewall_id: id.into(),
        firewall_name: name.into(),
        matched_policy_id: policy.map(str::to_owned),
        action,
        policies_unavailable: false,
        issues: Vec::new(),
    }
}

const PROBES: &[(&str, &str, u16, &str)] = &[
    ("192.168.1.10", "8.8.8.8", 443, "tcp"),
    ("192.168.1.10", "192.168.7.7", 22, "tcp"),
    ("8.8.8.8", "1.1.1.1", 53, "udp"),
    ("2001:db8::1", "192.168.1.10", 0, "icmp"),
];

// ── Properties ──────────────────────────────────────────────────────

#[test]
fn first_match_order_decides_every_connection() {
    let accept_first = lab(&json!({"FW-01": [
        {"id": "P1", "order": 1, "action": "accept"},
        {"id": "P2", "order": 2, "action": "deny"}
    ]}));
    let deny_first = lab(&json!({"FW-01": [
        {"id": "P1", "order": 2, "action": "accept"},
        {"id": "P2", "order": 1, "action": "deny"}
    ]}));

    for &(src, dst, port, proto) in PROBES {
        let accepted = trace(&accept_first, src, dst, port, proto);
        assert!(accepted.allowed, "{src} -> {dst}");
        assert_eq!(accepted.hops[0].matched_policy_id.as_deref(), Some("P1"));

        let denied = trace(&deny_first, src, dst, port, proto);
        assert!(!denied.allowed, "{src} -> {dst}");
        assert_eq!(denied.hops[0].matched_policy_id.as_deref(), Some("P2"));
        assert_eq!(denied.hops[0].action, HopAction::Deny);
    }
}

#[test]
fn tracing_is_idempotent() {
    let snapshot = lab(&json!({"FW-01": [
        {"id": "lan-web", "src_addrs": "lan", "services": "WEB", "action": "accept"}
    ]}));
    for &(src, dst, port, proto) in PROBES {
        let first = serde_json::to_vec(&trace(&snapshot, src, dst, port, proto)).unwrap();
        let second = serde_json::to_vec(&trace(&snapshot, src, dst, port, proto)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn unmatched_address_falls_back_to_external() {
    let snapshot = lab(&json!({}));
    let topology = snapshot.topology();
    for raw in ["8.8.8.8", "10.255.255.1", "2001:db8::1", "0.0.0.0"] {
        let zone = topology.zone_for_ip(raw.parse().unwrap());
        assert_eq!(zone.name, "external", "{raw}");
    }
    let result = trace(&snapshot, "8.8.8.8", "9.9.9.9", 80, "tcp");
    assert_eq!(result.src_zone, "external");
    assert_eq!(result.dst_zone, "external");
}

#[test]
fn cyclic_group_fails_without_looping() {
    let snapshot = lab(&json!({"FW-01": [
        {"id": "cyclic", "order": 1, "src_addrs": "loop-a", "action": "deny"},
        {"id": "fallthrough", "order": 2, "action": "accept"}
    ]}));

    let err = snapshot.addresses().resolve("loop-a").unwrap_err();
    assert!(matches!(err, ResolveError::CyclicGroup { .. }), "{err}");

    // The broken policy is skipped; evaluation continues.
    let result = trace(&snapshot, "192.168.1.10", "8.8.8.8", 443, "tcp");
    assert!(result.allowed);
    assert_eq!(result.hops[0].matched_policy_id.as_deref(), Some("fallthrough"));
    assert_eq!(result.hops[0].issues.len(), 1);
}

#[test]
fn service_port_range_boundaries() {
    let snapshot = lab(&json!({"FW-01": [
        {"id": "web", "order": 1, "services": "WEB", "action": "accept"}
    ]}));
    let allowed = |port| trace(&snapshot, "192.168.1.10", "8.8.8.8", port, "tcp").allowed;
    for port in [80, 100, 443] {
        assert!(allowed(port), "port {port}");
    }
    for port in [79, 444] {
        assert!(!allowed(port), "port {port}");
    }

    let any = lab(&json!({"FW-01": [
        {"id": "any", "order": 1, "services": "EVERYTHING", "action": "accept"}
    ]}));
    for (port, proto) in [(1, "tcp"), (65535, "udp"), (0, "icmp"), (0, "gre")] {
        assert!(trace(&any, "192.168.1.10", "8.8.8.8", port, proto).allowed, "{proto}/{port}");
    }
}

#[test]
fn nat_inferred_only_leaving_internal_for_external() {
    let snapshot = lab(&json!({"FW-01": [{"id": "any", "action": "accept"}]}));
    assert!(trace(&snapshot, "192.168.1.10", "8.8.8.8", 443, "tcp").nat_required);
    assert!(!trace(&snapshot, "192.168.1.10", "192.168.2.20", 443, "tcp").nat_required);
}

// ── Reference scenarios ─────────────────────────────────────────────

#[test]
fn scenario_single_firewall_accepts() {
    let snapshot = lab(&json!({"FW-01": [
        {"id": "1", "order": 1, "src_zones": ["internal"], "dst_zones": "any",
         "services": "ALL", "action": "accept"}
    ]}));
    let result = trace(&snapshot, "192.168.1.10", "8.8.8.8", 443, "TCP");

    assert_eq!(
        result,
        PathTrace {
            allowed: true,
            hops: vec![hop("FW-01", "edge-01", Some("1"), HopAction::Accept)],
            blocked_by: None,
            nat_required: true,
            src_zone: "internal".into(),
            dst_zone: "external".into(),
        }
    );
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "allowed": true,
            "hops": [{
                "firewall_id": "FW-01",
                "firewall_name": "edge-01",
                "matched_policy_id": "1",
                "action": "accept"
            }],
            "blocked_by": null,
            "nat_required": true,
            "src_zone": "internal",
            "dst_zone": "external"
        })
    );
}

#[test]
fn scenario_empty_policy_list_blocks_with_implicit_deny() {
    let snapshot = lab(&json!({}));
    let result = trace(&snapshot, "192.168.1.10", "8.8.8.8", 443, "tcp");

    assert!(!result.allowed);
    assert_eq!(result.hops, vec![hop("FW-01", "edge-01", None, HopAction::NoMatch)]);
    assert_eq!(
        result.blocked_by,
        Some(BlockedBy {
            firewall_id: "FW-01".into(),
            policy_id: None,
        })
    );
    assert_eq!(
        serde_json::to_value(&result).unwrap()["hops"][0]["action"],
        json!("no_match")
    );
}

#[test]
fn scenario_second_firewall_denies() {
    let snapshot = lab(&json!({
        "FW-01": [{"id": "lan-out", "order": 1, "src_zones": "internal", "action": "accept"}],
        "FW-02": [{"id": "dmz-deny-all", "order": 1, "action": "deny"}]
    }));
    let result = trace(&snapshot, "192.168.1.10", "172.16.0.15", 443, "tcp");

    assert!(!result.allowed);
    assert_eq!(
        result.hops,
        vec![
            hop("FW-01", "edge-01", Some("lan-out"), HopAction::Accept),
            hop("FW-02", "dmz-02", Some("dmz-deny-all"), HopAction::Deny),
        ]
    );
    assert_eq!(
        result.blocked_by,
        Some(BlockedBy {
            firewall_id: "FW-02".into(),
            policy_id: Some("dmz-deny-all".into()),
        })
    );
    assert!(!result.nat_required);
}

#[test]
fn blocking_hop_stops_the_chain() {
    let snapshot = lab(&json!({
        "FW-01": [{"id": "deny", "action": "deny"}],
        "FW-02": [{"id": "allow", "action": "accept"}]
    }));
    let result = trace(&snapshot, "192.168.1.10", "172.16.0.15", 443, "tcp");
    assert_eq!(result.hops.len(), 1);
    assert_eq!(result.blocking_hop().unwrap().firewall_id, "FW-01");
}

// ── Hosting ─────────────────────────────────────────────────────────

#[test]
fn named_range_objects_match_inclusively() {
    let snapshot = lab(&json!({
        "FW-01": [{"id": "lan-out", "action": "accept"}],
        "FW-02": [{"id": "web", "order": 1, "dst_addrs": "web-dmz", "services": "tcp/443", "action": "accept"}]
    }));
    for (dst, expected) in [("172.16.0.10", true), ("172.16.0.20", true), ("172.16.0.21", false)] {
        assert_eq!(trace(&snapshot, "192.168.1.10", dst, 443, "tcp").allowed, expected, "{dst}");
    }
    assert!(AddressResolver::contains(
        &snapshot.addresses().resolve("web-dmz").unwrap(),
        "172.16.0.12".parse().unwrap()
    ));
}

#[test]
fn store_traces_requests_against_current_snapshot() {
    let store = SnapshotStore::new(lab(&json!({"FW-01": [{"id": "any", "action": "accept"}]})));
    let request: TraceRequest =
        serde_json::from_value(json!({"src": "192.168.1.10", "dst": "8.8.8.8", "port": 443})).unwrap();
    assert_eq!(request.protocol, "tcp");

    let result = store.current().tracer().trace_request(&request).unwrap();
    assert!(result.allowed);
    assert_eq!(store.current().generation(), 1);
}
