// ── Object resolution ──
//
// Address and service tables shared read-only by every trace.

pub mod address;
pub mod service;

pub use address::AddressResolver;
pub use service::ServiceResolver;
