//! `fwpath trace` -- one connection through the firewall chain.

use std::fmt::Write as _;

use fwpath_core::{HopAction, HopResult, PathTrace, Snapshot};

use crate::cli::{GlobalOpts, TraceArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

pub fn handle(snapshot: &Snapshot, args: &TraceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let result = snapshot
        .tracer()
        .trace(&args.src, &args.dst, args.port, &args.protocol)?;

    if let Some(path) = &args.save {
        util::write_json_file(path, &result)?;
        tracing::info!(path = %path.display(), "trace saved");
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &result,
        |t| trace_detail(t, args, color),
        |t| verdict(t).to_owned(),
    )?;
    output::print_output(&out, global.quiet);

    if args.fail_on_block && !result.allowed {
        return Err(CliError::Blocked { count: 1 });
    }
    Ok(())
}

pub(crate) fn verdict(trace: &PathTrace) -> &'static str {
    if trace.allowed { "allowed" } else { "blocked" }
}

fn tone_for(action: HopAction) -> Tone {
    if action.is_accept() { Tone::Good } else { Tone::Bad }
}

fn hop_line(index: usize, hop: &HopResult, color: bool) -> String {
    let policy = match (&hop.matched_policy_id, hop.policies_unavailable) {
        (_, true) => "policies unavailable".to_owned(),
        (Some(id), false) => format!("policy {id}"),
        (None, false) => "implicit deny".to_owned(),
    };
    let mut line = format!(
        "  {}. {} ({})  {}  {}",
        index + 1,
        hop.firewall_id,
        hop.firewall_name,
        paint(hop.action.as_str(), tone_for(hop.action), color),
        paint(policy, Tone::Muted, color),
    );
    for issue in &hop.issues {
        let _ = write!(line, "\n       ! {issue}");
    }
    line
}

fn trace_detail(trace: &PathTrace, args: &TraceArgs, color: bool) -> String {
    let verdict_text = if trace.allowed {
        paint("ALLOWED", Tone::Good, color)
    } else {
        paint("BLOCKED", Tone::Bad, color)
    };

    let mut lines = vec![
        format!(
            "Connection:   {} -> {} {}/{}",
            args.src,
            args.dst,
            args.protocol.to_ascii_lowercase(),
            args.port
        ),
        format!("Verdict:      {verdict_text}"),
        format!("Zones:        {} -> {}", trace.src_zone, trace.dst_zone),
        format!("NAT required: {}", if trace.nat_required { "yes" } else { "no" }),
        "Hops:".to_owned(),
    ];
    lines.extend(
        trace
            .hops
            .iter()
            .enumerate()
            .map(|(i, hop)| hop_line(i, hop, color)),
    );
    if let Some(blocked) = &trace.blocked_by {
        lines.push(format!(
            "Blocked by:   {} ({})",
            blocked.firewall_id,
            blocked
                .policy_id
                .as_deref()
                .map_or_else(|| "implicit deny".to_owned(), |id| format!("policy {id}"))
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(action: HopAction, policy: Option<&str>) -> HopResult {
        HopResult {
            firewall_id: "FW-01".into(),
            firewall_name: "edge-01".into(),
            matched_policy_id: policy.map(str::to_owned),
            action,
            policies_unavailable: false,
            issues: Vec::new(),
        }
    }

    #[test]
    fn hop_line_names_the_deciding_policy() {
        let line = hop_line(0, &hop(HopAction::Accept, Some("7")), false);
        assert_eq!(line, "  1. FW-01 (edge-01)  accept  policy 7");

        let line = hop_line(1, &hop(HopAction::NoMatch, None), false);
        assert!(line.ends_with("no_match  implicit deny"), "{line}");

        let mut unavailable = hop(HopAction::NoMatch, None);
        unavailable.policies_unavailable = true;
        unavailable.issues.push("timeout".into());
        let line = hop_line(0, &unavailable, false);
        assert!(line.contains("policies unavailable"));
        assert!(line.contains("! timeout"));
    }
}
