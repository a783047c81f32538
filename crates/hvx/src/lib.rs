//! 🌾 hvx: walk a range of integer IDs, fetch whatever lives at each one, and commit
//! the records in bulk, with a fixed crew of workers doing the walking.
//!
//! Pieces, top to bottom:
//! - [`app_config`] loads the range, the knobs and the backend choices.
//! - [`backends`] holds the fetchers (where records come from) and sinks (where they go).
//! - [`harvest`] runs one range through a fixed worker pool and waits for everyone.
//! - [`events`] is how a run reports what happened, one [`events::HarvestEvent`] at a time.
//!
//! 🦆

pub mod app_config;
pub mod backends;
pub mod common;
mod composers;
pub mod events;
mod supervisors;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app_config::{AppConfig, HarvestConfig};
use crate::backends::{Fetcher, FetcherBackend, Sink, SinkBackend};
use crate::common::IdRange;
use crate::events::{HarvestObserver, TallySnapshot, TracingObserver};

pub use supervisors::harvest;

/// 🚀 Build the configured backends, harvest the configured range, close the sink.
///
/// Returns the run's tally. Individual fetch and flush failures land in the tally,
/// not in the `Err`; the `Err` is for the run itself not being able to happen.
pub async fn run(app_config: AppConfig) -> Result<TallySnapshot> {
    app_config
        .harvest
        .validate()
        .context("💀 The [harvest] section has settings that can't work")?;

    let fetcher = FetcherBackend::from_config(&app_config.source_config)
        .context("💀 Couldn't build the fetcher from source_config")?;
    let sink = SinkBackend::from_config(&app_config.sink_config)
        .await
        .context("💀 Couldn't build the sink from sink_config")?;

    let observer = Arc::new(TracingObserver::new());
    harvest_then_close(
        app_config.id_range,
        &app_config.harvest,
        Arc::new(fetcher),
        Arc::new(sink),
        observer.clone(),
    )
    .await?;

    let tally = observer.tally();
    info!(
        "✅ Done: {} visited, {} written, {} dropped",
        tally.visited, tally.records_written, tally.records_dropped
    );
    Ok(tally)
}

/// 🗑️ Harvest, then close the sink no matter how the harvest went.
///
/// Batches other workers already committed must still be released when one of
/// them panics. A harvest error outranks a close error; the close error is logged.
async fn harvest_then_close<F, S>(
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
    let harvested = harvest(id_range, harvest_config, fetcher, Arc::clone(&sink), observer).await;
    let closed = sink.close().await.context("💀 The sink didn't close cleanly");
    match (harvested, closed) {
        (Err(err), Err(close_err)) => {
            warn!("⚠️ The sink failed to close after a failed harvest: {:#}", close_err);
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), closed) => closed,
    }
}
