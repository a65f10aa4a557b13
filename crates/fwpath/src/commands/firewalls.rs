//! `fwpath firewalls` -- registered firewalls and their policy lists.

use serde::Serialize;
use tabled::Tabled;

use fwpath_core::{PolicyList, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct FirewallView {
    id: String,
    name: String,
    zones: Vec<String>,
    /// `None` when the policy list could not be obtained.
    policies: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unavailable: Option<String>,
}

#[derive(Tabled)]
struct FirewallRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Zones")]
    zones: String,
    #[tabled(rename = "Policies")]
    policies: String,
}

impl From<&FirewallView> for FirewallRow {
    fn from(fw: &FirewallView) -> Self {
        Self {
            id: fw.id.clone(),
            name: fw.name.clone(),
            zones: fw.zones.join(", "),
            policies: fw
                .policies
                .map_or_else(|| "unavailable".to_owned(), |n| n.to_string()),
        }
    }
}

pub fn handle(snapshot: &Snapshot, global: &GlobalOpts) -> Result<(), CliError> {
    let views: Vec<FirewallView> = snapshot
        .topology()
        .firewalls()
        .iter()
        .map(|fw| {
            let (policies, unavailable) = match snapshot.policies(&fw.id) {
                Some(PolicyList::Loaded(list)) => (Some(list.len()), None),
                Some(PolicyList::Unavailable { reason }) => (None, Some(reason.clone())),
                None => (Some(0), None),
            };
            FirewallView {
                id: fw.id.clone(),
                name: fw.name.clone(),
                zones: fw.zones.clone(),
                policies,
                unavailable,
            }
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &views,
        |fw| FirewallRow::from(fw),
        |fw| fw.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
