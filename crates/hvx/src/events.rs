//! 📡 Harvest events: the pipeline's diary.
//!
//! Workers and the supervisor never reach for a global logger. They narrate what
//! happened as [`HarvestEvent`]s to whatever [`HarvestObserver`] they were handed.
//! The default observer, [`TracingObserver`], turns the narration into `tracing`
//! output and keeps a running [`HarvestTally`]. Tests hand in their own observer and
//! read the diary back. Nobody has to grep stdout. Civilization.
//!
//! 🦆 The duck observes everything. The duck reports nothing.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, trace, warn};

/// 🚦 Where a harvest run is in its short life.
///
/// `NotStarted → Running → Draining → Done`. No detours, no rollbacks, no sequels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarvestPhase {
    #[default]
    NotStarted,
    /// 🏃 Workers are up, IDs are being handed out.
    Running,
    /// 🚰 Every ID has been handed off; workers are finishing and flushing leftovers.
    Draining,
    /// 🏁 Every worker has joined.
    Done,
}

/// 📜 Something worth knowing happened during a harvest.
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    PhaseChanged {
        from: HarvestPhase,
        to: HarvestPhase,
    },
    WorkerStarted {
        worker_id: usize,
    },
    WorkerStopped {
        worker_id: usize,
    },
    /// ✅ The fetch came back with a record.
    RecordFound {
        worker_id: usize,
        id: u64,
    },
    /// 🤷 Nothing lives at this ID. Expected, skipped, not an error.
    NotFound {
        worker_id: usize,
        id: u64,
    },
    /// ⚠️ The fetch failed for some other reason. Skipped for good this run.
    FetchFailed {
        worker_id: usize,
        id: u64,
        cause: String,
    },
    /// 📦 A batch made it into the sink.
    Flushed {
        worker_id: usize,
        records: usize,
    },
    /// 💀 The sink refused a batch. Its records are gone for this run.
    FlushFailed {
        worker_id: usize,
        records: usize,
        cause: String,
    },
}

/// 👀 Receives harvest events. Must be shareable across workers.
pub trait HarvestObserver: Send + Sync {
    fn on_event(&self, event: &HarvestEvent);
}

/// 🤐 Hears everything, says nothing. For benches and anyone who enjoys silence.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl HarvestObserver for SilentObserver {
    fn on_event(&self, _event: &HarvestEvent) {}
}

/// 🧮 Running counters for a harvest run, safe to bump from every worker at once.
#[derive(Debug, Default)]
pub struct HarvestTally {
    found: AtomicU64,
    not_found: AtomicU64,
    fetch_failures: AtomicU64,
    flushes: AtomicU64,
    flush_failures: AtomicU64,
    records_written: AtomicU64,
    records_dropped: AtomicU64,
}

/// 📸 A frozen copy of a [`HarvestTally`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TallySnapshot {
    pub visited: u64,
    pub found: u64,
    pub not_found: u64,
    pub fetch_failures: u64,
    pub flushes: u64,
    pub flush_failures: u64,
    pub records_written: u64,
    pub records_dropped: u64,
}

impl HarvestTally {
    pub fn record(&self, event: &HarvestEvent) {
        // -- 🔢 Relaxed is plenty: nobody reads these mid-flight, and the join
        // -- before the snapshot orders everything that matters.
        match event {
            HarvestEvent::RecordFound { .. } => {
                self.found.fetch_add(1, Ordering::Relaxed);
            }
            HarvestEvent::NotFound { .. } => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            HarvestEvent::FetchFailed { .. } => {
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
            }
            HarvestEvent::Flushed { records, .. } => {
                self.flushes.fetch_add(1, Ordering::Relaxed);
                self.records_written
                    .fetch_add(*records as u64, Ordering::Relaxed);
            }
            HarvestEvent::FlushFailed { records, .. } => {
                self.flush_failures.fetch_add(1, Ordering::Relaxed);
                self.records_dropped
                    .fetch_add(*records as u64, Ordering::Relaxed);
            }
            HarvestEvent::PhaseChanged { .. }
            | HarvestEvent::WorkerStarted { .. }
            | HarvestEvent::WorkerStopped { .. } => {}
        }
    }

    pub fn snapshot(&self) -> TallySnapshot {
        let found = self.found.load(Ordering::Relaxed);
        let not_found = self.not_found.load(Ordering::Relaxed);
        let fetch_failures = self.fetch_failures.load(Ordering::Relaxed);
        TallySnapshot {
            visited: found + not_found + fetch_failures,
            found,
            not_found,
            fetch_failures,
            flushes: self.flushes.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

/// 🍞 The default observer: logs through `tracing` and keeps score.
///
/// Level map: not-found is `trace` (it happens a lot and it's fine), fetch failures are
/// `warn`, flush failures are `error` because that's real data on the floor.
#[derive(Debug, Default)]
pub struct TracingObserver {
    tally: HarvestTally,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> TallySnapshot {
        self.tally.snapshot()
    }
}

impl HarvestObserver for TracingObserver {
    fn on_event(&self, event: &HarvestEvent) {
        self.tally.record(event);
        match event {
            HarvestEvent::PhaseChanged { from, to } => {
                info!("🚦 Harvest phase: {:?} → {:?}", from, to);
            }
            HarvestEvent::WorkerStarted { worker_id } => {
                debug!(worker_id, "🧵 Worker clocked in");
            }
            HarvestEvent::WorkerStopped { worker_id } => {
                debug!(worker_id, "🏁 Worker drained and clocked out");
            }
            HarvestEvent::RecordFound { worker_id, id } => {
                trace!(worker_id, id, "✅ Record found");
            }
            HarvestEvent::NotFound { worker_id, id } => {
                trace!(worker_id, id, "🤷 Nothing lives here, moving on");
            }
            HarvestEvent::FetchFailed {
                worker_id,
                id,
                cause,
            } => {
                warn!(worker_id, id, "⚠️ Fetch failed, skipping for this run: {}", cause);
            }
            HarvestEvent::Flushed { worker_id, records } => {
                debug!(worker_id, records, "📦 Batch committed");
            }
            HarvestEvent::FlushFailed {
                worker_id,
                records,
                cause,
            } => {
                error!(
                    worker_id,
                    records, "💀 Bulk write failed, batch dropped: {}", cause
                );
            }
        }
    }
}
