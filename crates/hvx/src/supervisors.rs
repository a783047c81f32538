//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where workers toil endlessly..."
//! 🎬 "One supervisor dared to wait for all of them."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module: part middle manager, part helicopter parent.
//!
//! It hires a fixed crew of [`HarvestWorker`](workers::HarvestWorker)s, walks the ID
//! range handing out one ID at a time, and then stands at the door until every
//! single worker has flushed and clocked out. Only then does it go home.
//!
//! ⚠️ Workers stay private to this module. Like Fight Club, but for async tasks.

mod id_source;
mod workers;

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::info;

use crate::app_config::HarvestConfig;
use crate::backends::{Fetcher, Sink};
use crate::common::IdRange;
use crate::events::{HarvestEvent, HarvestObserver, HarvestPhase};
use workers::{HarvestWorker, Worker};

/// 📦 The Supervisor: because even async tasks need someone hovering over them
/// asking "is it done yet?"
pub(crate) struct Supervisor<F, S> {
    harvest_config: HarvestConfig,
    fetcher: Arc<F>,
    sink: Arc<S>,
    observer: Arc<dyn HarvestObserver>,
}

impl<F, S> Supervisor<F, S>
where
    F: Fetcher + 'static,
    S: Sink + 'static,
{
    pub(crate) fn new(
        harvest_config: HarvestConfig,
        fetcher: Arc<F>,
        sink: Arc<S>,
        observer: Arc<dyn HarvestObserver>,
    ) -> Self {
        Self {
            harvest_config,
            fetcher,
            sink,
            observer,
        }
    }

    fn transition(&self, from: HarvestPhase, to: HarvestPhase) -> HarvestPhase {
        self.observer
            .on_event(&HarvestEvent::PhaseChanged { from, to });
        to
    }

    /// 🧵 Run one harvest over `id_range`, start to finish.
    ///
    /// Every ID is handed to exactly one worker. Returns once every worker has
    /// drained its bucket and stopped, whatever happened to individual fetches and
    /// flushes along the way. Errors only for knob settings that can't work (caught
    /// before anyone is hired) or a worker that panicked.
    pub(crate) async fn harvest(&self, id_range: IdRange) -> Result<()> {
        self.harvest_config
            .validate()
            .context("💀 Refusing to start the harvest")?;

        let worker_count = self.harvest_config.worker_count;
        info!(
            "🌾 Harvesting {} ({} IDs) with {} workers, {} records per bulk write",
            id_range,
            id_range.len(),
            worker_count,
            self.harvest_config.batch_size
        );

        let phase = self.transition(HarvestPhase::NotStarted, HarvestPhase::Running);
        let (feeder, ids) = id_source::handoff();
        let handles: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|worker_id| {
                HarvestWorker::new(
                    worker_id,
                    ids.clone(),
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.sink),
                    self.harvest_config.batch_size,
                    Arc::clone(&self.observer),
                )
                .start()
            })
            .collect();
        // -- 🔒 Only workers hold receivers. If they all die, the feeder finds out instead of
        // -- waiting forever on a channel nobody reads.
        drop(ids);

        let fed = feeder
            .feed(id_range)
            .await
            .context("💀 The ID feeder stopped before the end of the range");
        let phase = self.transition(phase, HarvestPhase::Draining);

        let joined = join_all(handles).await;
        self.transition(phase, HarvestPhase::Done);

        for (worker_id, outcome) in joined.into_iter().enumerate() {
            outcome.with_context(|| format!("💀 Worker {} panicked mid-harvest", worker_id))?;
        }
        let handed_off = fed?;
        info!("🏁 Harvest of {} finished, {} IDs handed off", id_range, handed_off);
        Ok(())
    }
}

/// 🚀 Harvest every ID in `id_range` with a fixed pool of workers.
///
/// Blocks (well, awaits) until the whole range has been visited and every worker
/// has flushed what it found. Per-ID and per-batch trouble is reported to
/// `observer` and otherwise swallowed; the caller closes `sink` afterwards.
pub async fn harvest<F, S>(
    id_range: IdRange,
    harvest_config: &HarvestConfig,
    fetcher: Arc<F>,
    sink: Arc<S>,
    observer: Arc<dyn HarvestObserver>,
) -> Result<()>
where
    F: Fetcher + 'static,
    S: Sink + 'static,
{
    Supervisor::new(harvest_config.clone(), fetcher, sink, observer)
        .harvest(id_range)
        .await
}
