//! Shared configuration for fwpath.
//!
//! TOML profiles, environment overrides, and translation to
//! `fwpath_core::EngineOptions`. The CLI layers `GlobalOpts`-aware
//! overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fwpath_core::{EngineOptions, NatRule, TopologyOptions};

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `FWPATH_DEFAULTS__OUTPUT=json`.
pub const ENV_PREFIX: &str = "FWPATH_";

/// Overrides the config file location when set.
pub const CONFIG_PATH_ENV: &str = "FWPATH_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String, available: Vec<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named snapshot profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named snapshot profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Reference data file (JSON, YAML or TOML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,

    /// Zone for addresses outside every registered zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_zone: Option<String>,

    /// Firewall used when no firewall owns the zones on a path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_firewall: Option<String>,

    /// Zones whose traffic is assumed to be NATed on the way out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_source_zones: Option<Vec<String>>,

    /// Zones that trigger NAT inference as a destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_destination_zones: Option<Vec<String>>,
}

impl Config {
    /// Resolve a profile by explicit name, else the default profile.
    ///
    /// An explicit name must exist. A missing default profile yields an
    /// empty one so flags alone are enough to run.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get(name)
                .cloned()
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile {
                    name: name.to_owned(),
                    available: self.profiles.keys().cloned().collect(),
                });
        }
        let name = self
            .default_profile
            .clone()
            .unwrap_or_else(|| "default".into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        Ok((name, profile))
    }
}

impl Profile {
    /// Translate to core engine options, filling gaps with core defaults.
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        let defaults = EngineOptions::default();

        let external_zone = match &self.external_zone {
            Some(zone) if zone.trim().is_empty() => {
                return Err(ConfigError::Validation {
                    field: "external_zone".into(),
                    reason: "must not be empty".into(),
                });
            }
            Some(zone) => zone.trim().to_owned(),
            None => defaults.topology.external_zone,
        };

        Ok(EngineOptions {
            topology: TopologyOptions {
                external_zone,
                fallback_firewall: self
                    .fallback_firewall
                    .clone()
                    .filter(|id| !id.trim().is_empty()),
            },
            nat: NatRule {
                source_zones: self
                    .nat_source_zones
                    .clone()
                    .unwrap_or(defaults.nat.source_zones),
                destination_zones: self
                    .nat_destination_zones
                    .clone()
                    .or(defaults.nat.destination_zones),
            },
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `FWPATH_CONFIG`, else platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "fwpath", "fwpath").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("fwpath");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing file is fine) merged with `FWPATH_` env vars.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
