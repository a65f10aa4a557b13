// ── Path tracing ──
//
// Resolves both endpoints to zones, asks the topology for the firewall
// chain, and evaluates each firewall in order until one does not accept.
// A trace only reads its snapshot, so any number may run concurrently.

use std::borrow::Cow;
use std::net::IpAddr;

use tracing::debug;

use crate::error::CoreError;
use crate::evaluator::PolicyEvaluator;
use crate::model::{
    BlockedBy, ConnectionTuple, FirewallDevice, HopAction, HopResult, PathTrace, TraceRequest,
};
use crate::store::{PolicyList, Snapshot};

/// Traces connections against one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PathTracer<'s> {
    snapshot: &'s Snapshot,
}

impl<'s> PathTracer<'s> {
    pub fn new(snapshot: &'s Snapshot) -> Self {
        Self { snapshot }
    }

    /// Trace `src` → `dst` on `protocol`/`port`.
    ///
    /// Fails only when an endpoint is not an IP address or the protocol is
    /// empty. Reference data problems never fail a trace; they surface as
    /// hop issues or unavailable hops.
    pub fn trace(
        &self,
        src: &str,
        dst: &str,
        port: u16,
        protocol: &str,
    ) -> Result<PathTrace, CoreError> {
        let src_ip = parse_endpoint("source", src)?;
        let dst_ip = parse_endpoint("destination", dst)?;
        if protocol.trim().is_empty() {
            return Err(CoreError::InvalidRequest {
                message: "protocol must not be empty".into(),
            });
        }
        Ok(self.trace_connection(&ConnectionTuple::new(src_ip, dst_ip, protocol, port)))
    }

    pub fn trace_request(&self, request: &TraceRequest) -> Result<PathTrace, CoreError> {
        self.trace(&request.src, &request.dst, request.port, &request.protocol)
    }

    /// Trace an already-parsed connection.
    pub fn trace_connection(&self, conn: &ConnectionTuple) -> PathTrace {
        let topology = self.snapshot.topology();
        let src_zone = topology.zone_for_ip(conn.src_ip);
        let dst_zone = topology.zone_for_ip(conn.dst_ip);
        let chain = topology.firewall_chain(src_zone, dst_zone);
        let evaluator = PolicyEvaluator::new(self.snapshot.addresses(), self.snapshot.services());

        let mut hops = Vec::with_capacity(chain.len());
        let mut blocked_by = None;

        for firewall_id in &chain {
            let device = topology.firewall(firewall_id).map_or_else(
                || Cow::Owned(FirewallDevice::new(firewall_id.clone(), firewall_id.clone())),
                Cow::Borrowed,
            );

            let hop = match self.snapshot.policies(firewall_id) {
                Some(PolicyList::Loaded(policies)) => {
                    let eval = evaluator.evaluate(&device, policies, conn, |ip| {
                        topology.zone_for_ip(ip)
                    });
                    HopResult {
                        firewall_id: firewall_id.clone(),
                        firewall_name: device.name.clone(),
                        matched_policy_id: eval.matched_id().map(str::to_owned),
                        action: eval.action,
                        policies_unavailable: false,
                        issues: eval.issues,
                    }
                }
                Some(PolicyList::Unavailable { reason }) => {
                    unavailable_hop(&device, format!("policies unavailable: {reason}"))
                }
                None => unavailable_hop(&device, format!("firewall '{firewall_id}' is not registered")),
            };

            debug!(
                firewall = %hop.firewall_id,
                action = hop.action.as_str(),
                policy = ?hop.matched_policy_id,
                "hop evaluated"
            );

            let stop = !hop.action.is_accept();
            if stop {
                blocked_by = Some(BlockedBy {
                    firewall_id: hop.firewall_id.clone(),
                    policy_id: hop.matched_policy_id.clone(),
                });
            }
            hops.push(hop);
            if stop {
                break;
            }
        }

        let options = self.snapshot.options();
        let nat_required =
            options
                .nat
                .applies(&src_zone.name, &dst_zone.name, &options.topology.external_zone);

        debug!(
            src = %conn.src_ip,
            dst = %conn.dst_ip,
            src_zone = %src_zone.name,
            dst_zone = %dst_zone.name,
            allowed = blocked_by.is_none(),
            hops = hops.len(),
            "trace complete"
        );

        PathTrace {
            allowed: blocked_by.is_none(),
            hops,
            blocked_by,
            nat_required,
            src_zone: src_zone.name.clone(),
            dst_zone: dst_zone.name.clone(),
        }
    }
}

fn parse_endpoint(field: &'static str, raw: &str) -> Result<IpAddr, CoreError> {
    raw.trim()
        .parse()
        .map_err(|err: std::net::AddrParseError| CoreError::ZoneResolutionFailed {
            field,
            input: raw.to_owned(),
            reason: err.to_string(),
        })
}

/// A hop whose policy list could not be consulted. It never accepts.
fn unavailable_hop(device: &FirewallDevice, issue: String) -> HopResult {
    HopResult {
        firewall_id: device.id.clone(),
        firewall_name: device.name.clone(),
        matched_policy_id: None,
        action: HopAction::NoMatch,
        policies_unavailable: true,
        issues: vec![issue],
    }
}
