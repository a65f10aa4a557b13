// ── Policy evaluation ──
//
// First-match-wins over one firewall's enabled policies, ascending by
// `order` with list position breaking ties. A policy whose references do
// not resolve is skipped and reported; it never aborts evaluation.

use std::net::IpAddr;

use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::model::{
    AddressRef, ConnectionTuple, FirewallDevice, FirewallPolicy, HopAction, PolicyAction,
    ServiceRef, Zone,
};
use crate::resolve::{AddressResolver, ServiceResolver};

/// Result of evaluating one firewall's policy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<'p> {
    pub matched: Option<&'p FirewallPolicy>,
    pub action: HopAction,
    /// One line per policy skipped because of broken references.
    pub issues: Vec<String>,
}

impl Evaluation<'_> {
    pub fn matched_id(&self) -> Option<&str> {
        self.matched.map(|p| p.id.as_str())
    }
}

/// Stateless evaluator over shared resolvers.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEvaluator<'r> {
    addresses: &'r AddressResolver,
    services: &'r ServiceResolver,
}

impl<'r> PolicyEvaluator<'r> {
    pub fn new(addresses: &'r AddressResolver, services: &'r ServiceResolver) -> Self {
        Self {
            addresses,
            services,
        }
    }

    /// Evaluate `policies` for `conn`, resolving zones through `zone_of`.
    pub fn evaluate<'p, 'z, F>(
        &self,
        firewall: &FirewallDevice,
        policies: &'p [FirewallPolicy],
        conn: &ConnectionTuple,
        zone_of: F,
    ) -> Evaluation<'p>
    where
        F: Fn(IpAddr) -> &'z Zone,
    {
        let src_zone = zone_of(conn.src_ip);
        let dst_zone = zone_of(conn.dst_ip);

        let mut ordered: Vec<&FirewallPolicy> = policies.iter().filter(|p| p.enabled).collect();
        ordered.sort_by_key(|p| p.order);

        let mut issues = Vec::new();
        for policy in ordered {
            match self.policy_matches(policy, conn, src_zone, dst_zone) {
                Ok(true) => {
                    debug!(
                        firewall = %firewall.id,
                        policy = %policy.id,
                        order = policy.order,
                        action = ?policy.action,
                        "policy matched"
                    );
                    return Evaluation {
                        matched: Some(policy),
                        action: match policy.action {
                            PolicyAction::Accept => HopAction::Accept,
                            PolicyAction::Deny => HopAction::Deny,
                        },
                        issues,
                    };
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(firewall = %firewall.id, policy = %policy.id, error = %err, "skipping policy");
                    issues.push(format!("policy {} skipped: {err}", policy.id));
                }
            }
        }

        debug!(firewall = %firewall.id, "no policy matched");
        Evaluation {
            matched: None,
            action: HopAction::NoMatch,
            issues,
        }
    }

    fn policy_matches(
        &self,
        policy: &FirewallPolicy,
        conn: &ConnectionTuple,
        src_zone: &Zone,
        dst_zone: &Zone,
    ) -> Result<bool, ResolveError> {
        if !policy.src_zones.matches(&src_zone.name) || !policy.dst_zones.matches(&dst_zone.name) {
            return Ok(false);
        }
        // Resolve every reference before deciding, so a broken object skips
        // the policy regardless of where it sits in the list.
        let src_ok = self.addresses_contain(&policy.src_addrs, conn.src_ip)?;
        let dst_ok = self.addresses_contain(&policy.dst_addrs, conn.dst_ip)?;
        let svc_ok = self.services_match(&policy.services, &conn.protocol, conn.port)?;
        Ok(src_ok && dst_ok && svc_ok)
    }

    fn addresses_contain(&self, refs: &[AddressRef], ip: IpAddr) -> Result<bool, ResolveError> {
        let mut hit = false;
        for reference in refs {
            let networks = self.addresses.resolve_ref(reference)?;
            hit |= AddressResolver::contains(&networks, ip);
        }
        Ok(hit)
    }

    fn services_match(
        &self,
        refs: &[ServiceRef],
        protocol: &str,
        port: u16,
    ) -> Result<bool, ResolveError> {
        let mut hit = false;
        for reference in refs {
            let svc = self.services.resolve_ref(reference)?;
            hit |= ServiceResolver::matches(&svc, protocol, port);
        }
        Ok(hit)
    }
}
