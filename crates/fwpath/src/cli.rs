//! Clap derive structures for the `fwpath` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fwpath -- trace connections through firewall policy
#[derive(Debug, Parser)]
#[command(
    name = "fwpath",
    version,
    about = "Trace connections through firewall policy",
    long_about = "Answers whether a connection is permitted across a network of firewalls.\n\n\
        Resolves both endpoints to zones, derives the firewall chain between them,\n\
        and evaluates each firewall's ordered policies first-match-wins against a\n\
        reference data snapshot (address/service objects, zones, firewalls, policies).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "FWPATH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Reference data snapshot file: JSON, YAML or TOML (overrides profile)
    #[arg(long, short = 'f', env = "FWPATH_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Zone for addresses outside every registered zone (overrides profile)
    #[arg(long, global = true)]
    pub external_zone: Option<String>,

    /// Firewall used when no firewall owns the zones on a path (overrides profile)
    #[arg(long, global = true)]
    pub fallback_firewall: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FWPATH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Trace one connection through the firewall chain
    #[command(alias = "t")]
    Trace(TraceArgs),

    /// Trace many connections from a request file
    Batch(BatchArgs),

    /// Build the snapshot and report reference data issues
    #[command(alias = "check")]
    Validate,

    /// List zones with their networks and owning firewalls
    Zones,

    /// List firewalls and the state of their policy lists
    #[command(alias = "fw")]
    Firewalls,

    /// List a firewall's policies in evaluation order
    Policies(PoliciesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TRACE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TraceArgs {
    /// Source IP address
    #[arg(long, short = 's')]
    pub src: String,

    /// Destination IP address
    #[arg(long, short = 'd')]
    pub dst: String,

    /// Destination port
    #[arg(long, short = 'P')]
    pub port: u16,

    /// Protocol (tcp, udp, icmp, ...)
    #[arg(long, default_value = "tcp")]
    pub protocol: String,

    /// Also write the result as JSON to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Exit with status 10 when the connection is blocked
    #[arg(long)]
    pub fail_on_block: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Request file: a JSON or YAML list of {src, dst, port, protocol}
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Maximum traces running at once
    #[arg(long, short = 'j', default_value = "8", value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Exit with status 10 when any connection is blocked
    #[arg(long)]
    pub fail_on_block: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POLICIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    /// Firewall ID
    #[arg(long, short = 'F')]
    pub firewall: String,

    /// Hide disabled policies
    #[arg(long)]
    pub enabled_only: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with one profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Snapshot file the profile points at
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: snapshot, external_zone, fallback_firewall,
        /// nat_source_zones, nat_destination_zones
        key: String,

        /// Value; zone lists are comma-separated
        value: String,
    },

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
