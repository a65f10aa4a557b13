// ── Engine configuration ──
//
// Knobs that shape topology fallbacks and NAT inference. Profiles in
// `fwpath-config` deserialize straight into these.

use serde::{Deserialize, Serialize};

/// Topology fallbacks used when reference data has gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyOptions {
    /// Zone an address falls into when no registered zone contains it.
    pub external_zone: String,

    /// Firewall used when no firewall owns any zone on a path. `None`
    /// selects the first registered firewall.
    pub fallback_firewall: Option<String>,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            external_zone: "external".into(),
            fallback_firewall: None,
        }
    }
}

/// Static NAT inference rule: NAT is assumed whenever a flow leaves one of
/// `source_zones` for one of `destination_zones`. This models a common
/// enterprise egress convention, not anything read from the policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatRule {
    pub source_zones: Vec<String>,

    /// Destination zones that trigger NAT. `None` means the topology's
    /// external zone, whatever it is named.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_zones: Option<Vec<String>>,
}

impl Default for NatRule {
    fn default() -> Self {
        Self {
            source_zones: vec!["internal".into(), "branch".into()],
            destination_zones: None,
        }
    }
}

impl NatRule {
    pub fn applies(&self, src_zone: &str, dst_zone: &str, external_zone: &str) -> bool {
        let from_source = self
            .source_zones
            .iter()
            .any(|z| z.eq_ignore_ascii_case(src_zone));
        let to_destination = match &self.destination_zones {
            Some(zones) => zones.iter().any(|z| z.eq_ignore_ascii_case(dst_zone)),
            None => external_zone.eq_ignore_ascii_case(dst_zone),
        };
        from_source && to_destination
    }
}

/// Everything a snapshot needs beyond the reference data itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub topology: TopologyOptions,
    pub nat: NatRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_nat_rule() {
        let nat = NatRule::default();
        assert!(nat.applies("internal", "external", "external"));
        assert!(nat.applies("Branch", "EXTERNAL", "external"));
        assert!(!nat.applies("internal", "internal", "external"));
        assert!(!nat.applies("dmz", "external", "external"));
    }

    #[test]
    fn nat_destination_follows_renamed_external_zone() {
        let nat = NatRule::default();
        assert!(nat.applies("internal", "wan", "wan"));
        assert!(!nat.applies("internal", "external", "wan"));

        let explicit = NatRule {
            destination_zones: Some(vec!["partner".into()]),
            ..NatRule::default()
        };
        assert!(explicit.applies("internal", "partner", "wan"));
        assert!(!explicit.applies("internal", "wan", "wan"));
    }
}
