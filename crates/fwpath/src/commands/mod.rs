//! Command dispatch: bridges CLI args -> snapshot queries -> output formatting.

pub mod batch;
pub mod config_cmd;
pub mod firewalls;
pub mod policies;
pub mod trace;
pub mod util;
pub mod validate;
pub mod zones;

use std::sync::Arc;

use crate::cli::{Command, GlobalOpts};
use crate::config::RunContext;
use crate::error::CliError;

/// Dispatch a snapshot-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &RunContext, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = util::load_snapshot(ctx)?;

    match cmd {
        Command::Trace(args) => trace::handle(&snapshot, &args, global),
        Command::Batch(args) => batch::handle(Arc::new(snapshot), &args, global).await,
        Command::Validate => validate::handle(&snapshot, ctx, global),
        Command::Zones => zones::handle(&snapshot, global),
        Command::Firewalls => firewalls::handle(&snapshot, global),
        Command::Policies(args) => policies::handle(&snapshot, &args, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
