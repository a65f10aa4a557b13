//! `fwpath validate` -- build the snapshot and report what is wrong with it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use fwpath_core::{LoadIssue, PolicyList, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::RunContext;
use crate::error::CliError;
use crate::output;

/// Summary of a snapshot build.
#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    profile: &'a str,
    snapshot: String,
    loaded_at: DateTime<Utc>,
    address_objects: usize,
    service_objects: usize,
    zones: usize,
    firewalls: usize,
    unavailable_firewalls: Vec<&'a str>,
    issues: &'a [LoadIssue],
}

impl<'a> ValidationReport<'a> {
    fn new(ctx: &'a RunContext, snapshot: &'a Snapshot) -> Self {
        let topology = snapshot.topology();
        Self {
            profile: &ctx.profile_name,
            snapshot: ctx.snapshot_path.display().to_string(),
            loaded_at: snapshot.loaded_at(),
            address_objects: snapshot.addresses().len(),
            service_objects: snapshot.services().len(),
            zones: topology.zones().len(),
            firewalls: topology.firewalls().len(),
            unavailable_firewalls: topology
                .firewalls()
                .iter()
                .filter(|fw| {
                    matches!(
                        snapshot.policies(&fw.id),
                        Some(PolicyList::Unavailable { .. })
                    )
                })
                .map(|fw| fw.id.as_str())
                .collect(),
            issues: snapshot.issues(),
        }
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Problem")]
    message: String,
}

impl From<&LoadIssue> for IssueRow {
    fn from(issue: &LoadIssue) -> Self {
        Self {
            kind: issue.kind.to_string(),
            subject: issue.subject.clone(),
            message: issue.message.clone(),
        }
    }
}

pub fn handle(snapshot: &Snapshot, ctx: &RunContext, global: &GlobalOpts) -> Result<(), CliError> {
    let report = ValidationReport::new(ctx, snapshot);

    let out = match global.output {
        OutputFormat::Table => {
            output::print_note(&summary(&report), global.quiet);
            if report.issues.is_empty() {
                String::new()
            } else {
                output::render_list(
                    &global.output,
                    report.issues,
                    |i| IssueRow::from(i),
                    ToString::to_string,
                )?
            }
        }
        OutputFormat::Plain => report
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => output::render_single(&global.output, &report, summary, summary)?,
    };
    output::print_output(&out, global.quiet);

    if report.issues.is_empty() {
        Ok(())
    } else {
        Err(CliError::InvalidData {
            count: report.issues.len(),
        })
    }
}

fn summary(report: &ValidationReport<'_>) -> String {
    let mut line = format!(
        "{}: {} address objects, {} service objects, {} zones, {} firewalls, {} issue(s)",
        report.snapshot,
        report.address_objects,
        report.service_objects,
        report.zones,
        report.firewalls,
        report.issues.len()
    );
    if !report.unavailable_firewalls.is_empty() {
        line.push_str(&format!(
            "\npolicies unavailable for: {}",
            report.unavailable_firewalls.join(", ")
        ));
    }
    line
}
