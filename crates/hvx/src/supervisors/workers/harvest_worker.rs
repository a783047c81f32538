//! 🎬 *[an ID arrives. a fetch goes out. a bucket slowly fills.]*
//!
//! 🌾 The HarvestWorker: pull an ID, fetch it, drop the record in the bucket, and
//! when the bucket is full tip it into the sink. Repeat until the IDs run out, tip
//! whatever is left, clock out.
//!
//! Nothing that goes wrong in here leaves the worker. Missing records are skipped,
//! failed fetches are reported and skipped, failed bulk writes are reported and the
//! batch is let go. The worker keeps walking.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::Worker;
use crate::backends::{FetchOutcome, Fetcher, Sink};
use crate::common::{Record, RecordBatch};
use crate::events::{HarvestEvent, HarvestObserver};
use crate::supervisors::id_source::IdSource;

pub(in crate::supervisors) struct HarvestWorker<F, S> {
    worker_id: usize,
    ids: IdSource,
    fetcher: Arc<F>,
    sink: Arc<S>,
    batch: RecordBatch,
    observer: Arc<dyn HarvestObserver>,
}

impl<F, S> HarvestWorker<F, S>
where
    F: Fetcher + 'static,
    S: Sink + 'static,
{
    pub(in crate::supervisors) fn new(
        worker_id: usize,
        ids: IdSource,
        fetcher: Arc<F>,
        sink: Arc<S>,
        batch_size: usize,
        observer: Arc<dyn HarvestObserver>,
    ) -> Self {
        Self {
            worker_id,
            ids,
            fetcher,
            sink,
            batch: RecordBatch::new(batch_size),
            observer,
        }
    }

    async fn run(mut self) {
        let worker_id = self.worker_id;
        self.observer.on_event(&HarvestEvent::WorkerStarted { worker_id });

        while let Some(id) = self.ids.next_id().await {
            match self.fetcher.fetch(id).await {
                FetchOutcome::Found(record) => {
                    self.observer
                        .on_event(&HarvestEvent::RecordFound { worker_id, id });
                    if let Some(full_batch) = self.batch.push(record) {
                        self.flush(full_batch).await;
                    }
                }
                FetchOutcome::NotFound => {
                    self.observer.on_event(&HarvestEvent::NotFound { worker_id, id });
                }
                FetchOutcome::TransientError(cause) => {
                    self.observer.on_event(&HarvestEvent::FetchFailed {
                        worker_id,
                        id,
                        cause: format!("{cause:#}"),
                    });
                }
            }
        }

        // -- 🚰 Drain: the IDs are gone, the bucket may not be.
        if !self.batch.is_empty() {
            debug!(
                worker_id,
                "🚰 Draining {} leftover records",
                self.batch.len()
            );
            let leftovers = self.batch.take();
            self.flush(leftovers).await;
        }

        self.observer.on_event(&HarvestEvent::WorkerStopped { worker_id });
    }

    /// 📦 One bulk write, no retry. The batch was already taken out of the bucket, so
    /// success or failure, these records are never seen again by this worker.
    async fn flush(&self, records: Vec<Record>) {
        let worker_id = self.worker_id;
        let record_count = records.len();
        let event = match self.sink.bulk_write(records).await {
            Ok(()) => HarvestEvent::Flushed {
                worker_id,
                records: record_count,
            },
            Err(err) => HarvestEvent::FlushFailed {
                worker_id,
                records: record_count,
                cause: format!("{err:#}"),
            },
        };
        self.observer.on_event(&event);
    }
}

impl<F, S> Worker for HarvestWorker<F, S>
where
    F: Fetcher + 'static,
    S: Sink + 'static,
{
    fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
