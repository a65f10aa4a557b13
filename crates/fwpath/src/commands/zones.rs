//! `fwpath zones` -- registered zones, their networks and owners.

use serde::Serialize;
use tabled::Tabled;

use fwpath_core::Snapshot;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// A zone as the tracer sees it: effective owner included.
#[derive(Debug, Serialize)]
struct ZoneView {
    name: String,
    networks: Vec<String>,
    firewall: Option<String>,
    /// True for the catch-all zone of unmatched addresses.
    external: bool,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    name: String,
    #[tabled(rename = "Networks")]
    networks: String,
    #[tabled(rename = "Firewall")]
    firewall: String,
}

impl From<&ZoneView> for ZoneRow {
    fn from(z: &ZoneView) -> Self {
        let networks = if z.external && z.networks.is_empty() {
            "(everything else)".to_owned()
        } else {
            z.networks.join(", ")
        };
        Self {
            name: z.name.clone(),
            networks,
            firewall: z.firewall.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

pub fn handle(snapshot: &Snapshot, global: &GlobalOpts) -> Result<(), CliError> {
    let topology = snapshot.topology();
    let external = topology.external_zone();

    let mut views: Vec<ZoneView> = topology
        .zones()
        .iter()
        .map(|zone| ZoneView {
            name: zone.name.clone(),
            networks: zone.networks.iter().map(ToString::to_string).collect(),
            firewall: topology.owner_of(zone).map(str::to_owned),
            external: zone.is_named(&external.name),
        })
        .collect();
    if !views.iter().any(|v| v.external) {
        views.push(ZoneView {
            name: external.name.clone(),
            networks: Vec::new(),
            firewall: topology.owner_of(external).map(str::to_owned),
            external: true,
        });
    }

    let out = output::render_list(
        &global.output,
        &views,
        |z| ZoneRow::from(z),
        |z| z.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
