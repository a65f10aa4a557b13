// ── Policy / object sources ──
//
// The engine never talks to firewalls itself. Hosts hand it a
// `PolicySource`; everything is read once, up front, while a snapshot is
// built.

pub mod records;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, SourceError};

pub use records::{
    AddressRecord, FirewallRecord, OneOrMany, PolicyRecord, PortSpec, RouteRecord, Scalar,
    ServiceRecord, ZoneRecord,
};

/// Read-only provider of reference data.
///
/// `list_policies` may fail for a single firewall without failing the
/// snapshot; that firewall is then reported as unavailable and blocks any
/// path crossing it.
pub trait PolicySource {
    fn list_address_objects(&self) -> Result<Vec<AddressRecord>, SourceError>;
    fn list_service_objects(&self) -> Result<Vec<ServiceRecord>, SourceError>;
    fn list_zones(&self) -> Result<Vec<ZoneRecord>, SourceError>;
    fn list_firewalls(&self) -> Result<Vec<FirewallRecord>, SourceError>;
    fn list_policies(&self, firewall_id: &str) -> Result<Vec<PolicyRecord>, SourceError>;

    /// Operator-known zone-pair routes. Sources without any return nothing.
    fn list_routes(&self) -> Result<Vec<RouteRecord>, SourceError> {
        Ok(Vec::new())
    }
}

/// A complete reference data set held in memory, as exported to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotDocument {
    pub address_objects: Vec<AddressRecord>,
    pub service_objects: Vec<ServiceRecord>,
    pub zones: Vec<ZoneRecord>,
    pub firewalls: Vec<FirewallRecord>,
    /// Policy lists keyed by firewall ID.
    pub policies: IndexMap<String, Vec<PolicyRecord>>,
    pub routes: Vec<RouteRecord>,
}

impl SnapshotDocument {
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl PolicySource for SnapshotDocument {
    fn list_address_objects(&self) -> Result<Vec<AddressRecord>, SourceError> {
        Ok(self.address_objects.clone())
    }

    fn list_service_objects(&self) -> Result<Vec<ServiceRecord>, SourceError> {
        Ok(self.service_objects.clone())
    }

    fn list_zones(&self) -> Result<Vec<ZoneRecord>, SourceError> {
        Ok(self.zones.clone())
    }

    fn list_firewalls(&self) -> Result<Vec<FirewallRecord>, SourceError> {
        Ok(self.firewalls.clone())
    }

    /// A firewall without an entry simply has no policies.
    fn list_policies(&self, firewall_id: &str) -> Result<Vec<PolicyRecord>, SourceError> {
        Ok(self.policies.get(firewall_id).cloned().unwrap_or_default())
    }

    fn list_routes(&self) -> Result<Vec<RouteRecord>, SourceError> {
        Ok(self.routes.clone())
    }
}
