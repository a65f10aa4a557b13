// ── Core error types ──
//
// `ResolveError` covers reference-data inconsistencies hit while resolving
// object names. Those never abort a trace: the evaluator skips the policy
// that caused them and reports the message on the hop. `CoreError` is what
// callers of the tracer and the snapshot builder actually see.

use thiserror::Error;

/// Failure to resolve an address or service reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown address object '{name}'")]
    UnknownAddressObject { name: String },

    #[error("address group '{name}' is cyclic ({path})")]
    CyclicGroup { name: String, path: String },

    #[error("unknown service object '{name}'")]
    UnknownServiceObject { name: String },

    #[error("invalid {kind} literal '{value}': {reason}")]
    InvalidLiteral {
        kind: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure reported by a [`PolicySource`](crate::source::PolicySource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct SourceError {
    pub operation: String,
    pub message: String,
}

impl SourceError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Request errors ───────────────────────────────────────────────
    #[error("cannot resolve zone for {field} '{input}': {reason}")]
    ZoneResolutionFailed {
        field: &'static str,
        input: String,
        reason: String,
    },

    #[error("invalid trace request: {message}")]
    InvalidRequest { message: String },

    // ── Reference data errors ────────────────────────────────────────
    #[error("reference data unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("reference data could not be parsed: {0}")]
    Document(#[from] serde_json::Error),
}
