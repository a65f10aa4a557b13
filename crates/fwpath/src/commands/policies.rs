//! `fwpath policies` -- one firewall's policy list in evaluation order.

use tabled::Tabled;

use fwpath_core::{FirewallPolicy, PolicyAction, PolicyList, Snapshot};

use crate::cli::{GlobalOpts, PoliciesArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct PolicyRow {
    #[tabled(rename = "#")]
    order: i64,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Src Zone")]
    src_zones: String,
    #[tabled(rename = "Dst Zone")]
    dst_zones: String,
    #[tabled(rename = "Src Addr")]
    src_addrs: String,
    #[tabled(rename = "Dst Addr")]
    dst_addrs: String,
    #[tabled(rename = "Service")]
    services: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<&FirewallPolicy> for PolicyRow {
    fn from(p: &FirewallPolicy) -> Self {
        Self {
            order: p.order,
            id: p.id.clone(),
            name: p.name.clone().unwrap_or_default(),
            action: match p.action {
                PolicyAction::Accept => "accept".into(),
                PolicyAction::Deny => "deny".into(),
            },
            src_zones: p.src_zones.to_string(),
            dst_zones: p.dst_zones.to_string(),
            src_addrs: join(&p.src_addrs),
            dst_addrs: join(&p.dst_addrs),
            services: join(&p.services),
            enabled: if p.enabled { "yes" } else { "no" }.into(),
        }
    }
}

pub fn handle(
    snapshot: &Snapshot,
    args: &PoliciesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let Some(device) = snapshot.topology().firewall(&args.firewall) else {
        return Err(CliError::NotFound {
            resource_type: "firewall".into(),
            identifier: args.firewall.clone(),
            list_command: "firewalls".into(),
        });
    };

    let policies: Vec<FirewallPolicy> = match snapshot.policies(&device.id) {
        Some(PolicyList::Unavailable { reason }) => {
            return Err(CliError::PoliciesUnavailable {
                firewall: device.id.clone(),
                reason: reason.clone(),
            });
        }
        Some(list) => list
            .in_evaluation_order()
            .into_iter()
            .filter(|p| p.enabled || !args.enabled_only)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    let out = output::render_list(
        &global.output,
        &policies,
        |p| PolicyRow::from(p),
        |p| p.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
