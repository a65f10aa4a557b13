//! Config subcommand handlers.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Human-readable TOML-ish view of the resolved config.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref snapshot) = p.snapshot {
            let _ = writeln!(out, "snapshot = \"{}\"", snapshot.display());
        }
        if let Some(ref zone) = p.external_zone {
            let _ = writeln!(out, "external_zone = \"{zone}\"");
        }
        if let Some(ref fw) = p.fallback_firewall {
            let _ = writeln!(out, "fallback_firewall = \"{fw}\"");
        }
        if let Some(ref zones) = p.nat_source_zones {
            let _ = writeln!(out, "nat_source_zones = {zones:?}");
        }
        if let Some(ref zones) = p.nat_destination_zones {
            let _ = writeln!(out, "nat_destination_zones = {zones:?}");
        }
    }

    out.trim_end().to_owned()
}

fn zone_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .map(str::to_owned)
        .collect()
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init {
            name,
            snapshot,
            force,
        } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let mut cfg = Config::default();
            let profile = cfg.profiles.entry(name.clone()).or_default();
            profile.snapshot = snapshot.or_else(|| global.snapshot.clone());
            profile.external_zone.clone_from(&global.external_zone);
            profile.fallback_firewall.clone_from(&global.fallback_firewall);
            cfg.default_profile = Some(name.clone());

            let written = config::save_config(&cfg)?;
            output::print_note(
                &format!("✓ Wrote profile '{name}' to {}", written.display()),
                global.quiet,
            );
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.replace('-', "_").as_str() {
                "snapshot" => profile.snapshot = Some(PathBuf::from(&value)),
                "external_zone" => {
                    if value.trim().is_empty() {
                        return Err(CliError::Validation {
                            field: "external_zone".into(),
                            reason: "must not be empty".into(),
                        });
                    }
                    profile.external_zone = Some(value.trim().to_owned());
                }
                "fallback_firewall" => profile.fallback_firewall = Some(value.trim().to_owned()),
                "nat_source_zones" => profile.nat_source_zones = Some(zone_list(&value)),
                "nat_destination_zones" => profile.nat_destination_zones = Some(zone_list(&value)),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: snapshot, external_zone, \
                             fallback_firewall, nat_source_zones, nat_destination_zones"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            output::print_note(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                output::print_note("No profiles configured. Run: fwpath config init", global.quiet);
            } else {
                let listing = cfg
                    .profiles
                    .keys()
                    .map(|name| {
                        let marker = if name == default { " *" } else { "" };
                        format!("{name}{marker}")
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                output::print_output(&listing, global.quiet);
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::print_note(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
