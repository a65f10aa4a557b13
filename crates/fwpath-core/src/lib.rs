//! Firewall policy path analysis.
//!
//! Given a source IP, destination IP, destination port and protocol, this
//! crate answers whether the connection is permitted across a network of
//! firewalls, and why:
//!
//! - **[`PolicySource`]** — Read-only provider of address objects, service
//!   objects, zones, firewalls, operator routes and per-firewall policy
//!   lists. [`SnapshotDocument`] is the in-memory implementation used for
//!   exported files and tests.
//!
//! - **[`Snapshot`]** — Immutable bundle of converted reference data:
//!   [`AddressResolver`], [`ServiceResolver`], [`ZoneTopology`] and policy
//!   lists, plus the [`LoadIssue`]s found while building it.
//!
//! - **[`SnapshotStore`]** — `ArcSwap`-backed holder of the current
//!   snapshot; reloads swap in a complete replacement.
//!
//! - **[`PathTracer`]** — Resolves endpoints to zones, derives the firewall
//!   chain and runs first-match-wins [`PolicyEvaluator`] on each hop,
//!   producing a [`PathTrace`].

pub mod config;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod resolve;
pub mod source;
pub mod store;
pub mod topology;
pub mod tracer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{EngineOptions, NatRule, TopologyOptions};
pub use error::{CoreError, ResolveError, SourceError};
pub use evaluator::{Evaluation, PolicyEvaluator};
pub use resolve::{AddressResolver, ServiceResolver};
pub use source::{PolicySource, SnapshotDocument};
pub use store::{IssueKind, LoadIssue, PolicyList, Snapshot, SnapshotStore};
pub use topology::{RouteHop, RouteTable, ZoneRoute, ZoneTopology};
pub use tracer::PathTracer;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Objects
    AddressKind,
    AddressObject,
    AddressRef,
    // Trace results
    BlockedBy,
    ConnectionTuple,
    // Topology
    FirewallDevice,
    // Policies
    FirewallPolicy,
    HopAction,
    HopResult,
    PathTrace,
    PolicyAction,
    PortRange,
    ServiceObject,
    ServiceProtocol,
    ServiceRef,
    TraceRequest,
    Zone,
    ZoneMatch,
};
