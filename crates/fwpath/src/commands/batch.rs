//! `fwpath batch` -- many traces against one shared snapshot.
//!
//! Requests run on blocking worker tasks bounded by a semaphore. Every
//! task reads the same `Arc<Snapshot>`; results are reported in input
//! order regardless of completion order. Each entry of the input file is
//! read on its own, so one unreadable entry only fails itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use fwpath_core::{PathTrace, Snapshot, TraceRequest};

use crate::cli::{BatchArgs, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

/// One request with its outcome. Exactly one of `trace` / `error` is set.
/// An entry that is not a valid request keeps its raw form in `input`.
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    #[serde(flatten)]
    pub request: Option<TraceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<PathTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    fn unreadable(input: Value, error: &serde_json::Error) -> Self {
        Self {
            request: None,
            input: Some(input),
            trace: None,
            error: Some(format!("invalid request: {error}")),
        }
    }

    fn is_blocked(&self) -> bool {
        self.trace.as_ref().is_some_and(|t| !t.allowed)
    }
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Source")]
    src: String,
    #[tabled(rename = "Destination")]
    dst: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Zones")]
    zones: String,
    #[tabled(rename = "Verdict")]
    verdict: String,
    #[tabled(rename = "Blocked By")]
    blocked_by: String,
    #[tabled(rename = "NAT")]
    nat: String,
}

impl From<&BatchEntry> for BatchRow {
    fn from(entry: &BatchEntry) -> Self {
        let (zones, verdict, blocked_by, nat) = match (&entry.trace, &entry.error) {
            (Some(t), _) => (
                format!("{} -> {}", t.src_zone, t.dst_zone),
                super::trace::verdict(t).to_owned(),
                t.blocked_by.as_ref().map_or_else(String::new, |b| {
                    format!("{}/{}", b.firewall_id, b.policy_id.as_deref().unwrap_or("implicit"))
                }),
                if t.nat_required { "yes" } else { "no" }.to_owned(),
            ),
            (None, error) => (
                String::new(),
                format!("error: {}", error.as_deref().unwrap_or("unknown")),
                String::new(),
                String::new(),
            ),
        };
        let (src, dst, service) = match (&entry.request, &entry.input) {
            (Some(req), _) => (
                req.src.clone(),
                req.dst.clone(),
                format!("{}/{}", req.protocol.to_ascii_lowercase(), req.port),
            ),
            (None, raw) => (
                raw.as_ref().map_or_else(String::new, Value::to_string),
                String::new(),
                String::new(),
            ),
        };
        Self {
            src,
            dst,
            service,
            zones,
            verdict,
            blocked_by,
            nat,
        }
    }
}

pub async fn handle(
    snapshot: Arc<Snapshot>,
    args: &BatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let requests: Vec<Value> = util::read_structured(&args.input)?;
    tracing::info!(
        requests = requests.len(),
        concurrency = args.concurrency,
        "running batch trace"
    );

    let entries = run_batch(snapshot, requests, usize::from(args.concurrency)).await?;

    let out = output::render_list(
        &global.output,
        &entries,
        |e| BatchRow::from(e),
        |e| {
            e.trace
                .as_ref()
                .map_or("error", super::trace::verdict)
                .to_owned()
        },
    )?;
    output::print_output(&out, global.quiet);

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    let blocked = entries.iter().filter(|e| e.is_blocked()).count();
    output::print_note(
        &format!(
            "{} traced, {} blocked, {} failed",
            entries.len(),
            blocked,
            failed
        ),
        global.quiet || !matches!(global.output, crate::cli::OutputFormat::Table),
    );

    if failed > 0 {
        return Err(CliError::Validation {
            field: "input".into(),
            reason: format!("{failed} request(s) could not be traced"),
        });
    }
    if args.fail_on_block && blocked > 0 {
        return Err(CliError::Blocked { count: blocked });
    }
    Ok(())
}

/// Trace every request, at most `concurrency` at a time.
pub async fn run_batch(
    snapshot: Arc<Snapshot>,
    requests: Vec<Value>,
    concurrency: usize,
) -> Result<Vec<BatchEntry>, CliError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut slots: Vec<Option<BatchEntry>> =
        std::iter::repeat_with(|| None).take(requests.len()).collect();

    for (index, raw) in requests.into_iter().enumerate() {
        let request = match TraceRequest::deserialize(&raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping unreadable request");
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(BatchEntry::unreadable(raw, &e));
                }
                continue;
            }
        };
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| CliError::Task {
                reason: e.to_string(),
            })?;
        let snapshot = Arc::clone(&snapshot);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let outcome = snapshot.tracer().trace_request(&request);
            (index, request, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, request, outcome) = joined.map_err(|e| CliError::Task {
            reason: e.to_string(),
        })?;
        let (trace, error) = match outcome {
            Ok(trace) => (Some(trace), None),
            Err(e) => (None, Some(e.to_string())),
        };
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(BatchEntry {
                request: Some(request),
                input: None,
                trace,
                error,
            });
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
