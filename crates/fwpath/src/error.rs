//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fwpath_config::ConfigError;
use fwpath_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const INVALID_DATA: i32 = 6;
    pub const BLOCKED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Snapshot file ────────────────────────────────────────────────
    #[error("No snapshot file configured for profile '{profile}'")]
    #[diagnostic(
        code(fwpath::no_snapshot),
        help(
            "Pass --snapshot FILE (or set FWPATH_SNAPSHOT).\n\
             Or save one in the profile: fwpath config init --snapshot FILE"
        )
    )]
    NoSnapshot { profile: String },

    #[error("Could not read {path}")]
    #[diagnostic(code(fwpath::read_failed))]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type for {path}")]
    #[diagnostic(
        code(fwpath::unsupported_format),
        help("Use a .json, .yaml, .yml or .toml file.")
    )]
    UnsupportedFormat { path: String },

    #[error("Could not parse {path} as {format}: {reason}")]
    #[diagnostic(code(fwpath::parse_failed))]
    ParseFailed {
        path: String,
        format: &'static str,
        reason: String,
    },

    #[error("Reference data has {count} issue(s)")]
    #[diagnostic(
        code(fwpath::invalid_data),
        help("Affected policies are skipped during evaluation. Fix the records listed above.")
    )]
    InvalidData { count: usize },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(fwpath::not_found),
        help("Run: fwpath {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Policies for firewall '{firewall}' are unavailable: {reason}")]
    #[diagnostic(
        code(fwpath::policies_unavailable),
        help("Traces through this firewall are reported as blocked.")
    )]
    PoliciesUnavailable { firewall: String, reason: String },

    // ── Trace outcome ────────────────────────────────────────────────
    #[error("{count} traced connection(s) blocked")]
    #[diagnostic(code(fwpath::blocked))]
    Blocked { count: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fwpath::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fwpath::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fwpath config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(fwpath::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(fwpath::config))]
    Config(Box<ConfigError>),

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Trace task failed: {reason}")]
    #[diagnostic(code(fwpath::task))]
    Task { reason: String },

    #[error("Could not render {format} output: {reason}")]
    #[diagnostic(code(fwpath::render))]
    Render { format: &'static str, reason: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoSnapshot { .. }
            | Self::UnsupportedFormat { .. }
            | Self::Validation { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::ReadFailed { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                exit_code::NOT_FOUND
            }
            Self::ParseFailed { .. }
            | Self::InvalidData { .. }
            | Self::PoliciesUnavailable { .. } => exit_code::INVALID_DATA,
            Self::Blocked { .. } => exit_code::BLOCKED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Core error mapping ──────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ZoneResolutionFailed {
                field,
                input,
                reason,
            } => CliError::Validation {
                field: field.into(),
                reason: format!("'{input}': {reason}"),
            },
            CoreError::InvalidRequest { message } => CliError::Validation {
                field: "request".into(),
                reason: message,
            },
            CoreError::Source(e) => CliError::ParseFailed {
                path: e.operation,
                format: "reference data",
                reason: e.message,
            },
            CoreError::Document(e) => CliError::ParseFailed {
                path: "snapshot".into(),
                format: "JSON",
                reason: e.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name, available } => CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::Blocked { count: 1 }.exit_code(), exit_code::BLOCKED);
        assert_eq!(CliError::InvalidData { count: 3 }.exit_code(), exit_code::INVALID_DATA);
        assert_eq!(
            CliError::NoSnapshot { profile: "default".into() }.exit_code(),
            exit_code::USAGE
        );

        let missing = CliError::ReadFailed {
            path: "gone.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let denied = CliError::ReadFailed {
            path: "locked.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn bad_endpoint_is_a_usage_error() {
        let err = CliError::from(CoreError::ZoneResolutionFailed {
            field: "source",
            input: "10.0.0".into(),
            reason: "invalid IP address syntax".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn unknown_profile_lists_alternatives() {
        let err = CliError::from(ConfigError::UnknownProfile {
            name: "lab".into(),
            available: vec!["branch".into(), "default".into()],
        });
        assert!(matches!(
            err,
            CliError::ProfileNotFound { ref available, .. } if available == "branch, default"
        ));
    }
}
