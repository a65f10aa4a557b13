//! CLI configuration -- thin wrapper around `fwpath_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--snapshot, --external-zone, ...).

use std::path::PathBuf;

use fwpath_core::EngineOptions;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use fwpath_config::{Config, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Everything a snapshot-backed command needs before it can run.
#[derive(Debug)]
pub struct RunContext {
    pub profile_name: String,
    pub snapshot_path: PathBuf,
    pub options: EngineOptions,
}

/// Merge the active profile with CLI flag overrides.
///
/// Flags win over profile values; profile values win over core defaults.
pub fn resolve_run_context(global: &GlobalOpts) -> Result<RunContext, CliError> {
    let cfg = load_config()?;
    let (profile_name, profile) = cfg.profile(global.profile.as_deref())?;
    let mut options = profile.engine_options()?;

    if let Some(zone) = &global.external_zone {
        let zone = zone.trim();
        if zone.is_empty() {
            return Err(CliError::Validation {
                field: "external-zone".into(),
                reason: "must not be empty".into(),
            });
        }
        zone.clone_into(&mut options.topology.external_zone);
    }
    if let Some(firewall) = &global.fallback_firewall {
        options.topology.fallback_firewall = Some(firewall.trim().to_owned());
    }

    let snapshot_path = global
        .snapshot
        .clone()
        .or(profile.snapshot)
        .ok_or_else(|| CliError::NoSnapshot {
            profile: profile_name.clone(),
        })?;

    tracing::debug!(
        profile = %profile_name,
        snapshot = %snapshot_path.display(),
        external_zone = %options.topology.external_zone,
        "resolved run context"
    );

    Ok(RunContext {
        profile_name,
        snapshot_path,
        options,
    })
}
