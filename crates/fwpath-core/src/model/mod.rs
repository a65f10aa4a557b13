// ── Domain model ──
//
// Typed reference data (addresses, services, zones, firewalls, policies)
// and the trace request/result types. Everything here is plain data;
// resolution and evaluation live in their own modules.

pub mod address;
pub mod policy;
pub mod service;
pub mod trace;
pub mod zone;

pub use address::{AddressKind, AddressObject};
pub use policy::{AddressRef, FirewallPolicy, PolicyAction, ServiceRef, ZoneMatch};
pub use service::{PortRange, ServiceObject, ServiceProtocol};
pub use trace::{BlockedBy, ConnectionTuple, HopAction, HopResult, PathTrace, TraceRequest};
pub use zone::{FirewallDevice, Zone};
