// ── Snapshot store ──
//
// Holds the current `Snapshot` behind an `ArcSwap`. Readers grab the whole
// snapshot with one atomic load; a reload builds a complete replacement
// off to the side and swaps it in, so in-flight traces finish against the
// data they started with.

mod snapshot;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};

use crate::config::EngineOptions;
use crate::error::CoreError;
use crate::model::PathTrace;
use crate::source::PolicySource;

pub use snapshot::{IssueKind, LoadIssue, PolicyList, Snapshot};

/// Shared, hot-swappable snapshot holder.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
    generation: AtomicU64,
}

impl SnapshotStore {
    /// Start from an already-built snapshot (generation 1).
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot.with_generation(1)),
            generation: AtomicU64::new(1),
        }
    }

    /// Build the first snapshot from `source`.
    pub fn load(source: &dyn PolicySource, options: EngineOptions) -> Result<Self, CoreError> {
        Ok(Self::new(Snapshot::build(source, options)?))
    }

    /// The snapshot currently in effect.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Swap in `snapshot` under the next generation number. A concurrent
    /// publish that already installed a newer generation is never replaced.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(snapshot.with_generation(generation));
        let previous = self.current.rcu(|current| {
            if current.generation() > generation {
                Arc::clone(current)
            } else {
                Arc::clone(&snapshot)
            }
        });
        if previous.generation() > generation {
            debug!(generation, current = previous.generation(), "snapshot superseded before publish");
        } else {
            info!(generation, issues = snapshot.issues().len(), "snapshot published");
        }
        snapshot
    }

    /// Rebuild from `source` and publish. On failure the current snapshot
    /// stays in effect.
    pub fn reload(
        &self,
        source: &dyn PolicySource,
        options: EngineOptions,
    ) -> Result<Arc<Snapshot>, CoreError> {
        match Snapshot::build(source, options) {
            Ok(snapshot) => Ok(self.publish(snapshot)),
            Err(err) => {
                warn!(error = %err, "reload failed; keeping current snapshot");
                Err(err)
            }
        }
    }

    /// Trace against whatever snapshot is current when the call starts.
    pub fn trace(
        &self,
        src: &str,
        dst: &str,
        port: u16,
        protocol: &str,
    ) -> Result<PathTrace, CoreError> {
        let snapshot = self.current.load();
        snapshot.tracer().trace(src, dst, port, protocol)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
