//! 🧪 Test doubles for the harvest pipeline. Stunt performers: they take the hits so
//! the real backends don't have to.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use crate::backends::{FetchOutcome, Fetcher, Sink};
use crate::common::Record;
use crate::events::{HarvestEvent, HarvestObserver};

type Script = Box<dyn Fn(u64) -> FetchOutcome + Send + Sync>;

/// 🎭 A fetcher that answers from a closure and writes down every ID it was asked for.
pub(crate) struct ScriptedFetcher {
    script: Script,
    calls: Mutex<Vec<u64>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(script: impl Fn(u64) -> FetchOutcome + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every ID exists.
    pub(crate) fn all_found() -> Self {
        Self::new(Self::found)
    }

    pub(crate) fn found(id: u64) -> FetchOutcome {
        FetchOutcome::Found(Record::new(id, json!({ "id": id })))
    }

    /// 📋 Every ID fetched so far, in call order.
    pub(crate) fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

impl fmt::Debug for ScriptedFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedFetcher")
            .field("calls", &self.calls.lock().unwrap().len())
            .finish()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        self.calls.lock().unwrap().push(id);
        // 🎲 give the other workers a chance to interleave
        tokio::task::yield_now().await;
        (self.script)(id)
    }
}

/// 💥 A sink that rejects chosen bulk writes, counted from zero in arrival order.
#[derive(Debug, Default)]
pub(crate) struct FlakySink {
    failing_calls: HashSet<usize>,
    calls: AtomicUsize,
    closes: AtomicUsize,
    attempted: Mutex<Vec<Vec<Record>>>,
    committed: Mutex<Vec<Vec<Record>>>,
}

impl FlakySink {
    pub(crate) fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing_calls: calls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Every batch offered, accepted or not.
    pub(crate) fn attempted(&self) -> Vec<Vec<Record>> {
        self.attempted.lock().unwrap().clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Only the batches that were accepted.
    pub(crate) fn committed(&self) -> Vec<Vec<Record>> {
        self.committed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for FlakySink {
    async fn bulk_write(&self, records: Vec<Record>) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.attempted.lock().unwrap().push(records.clone());
        if self.failing_calls.contains(&call) {
            anyhow::bail!("💀 bulk write #{call} rejected: the index is having a day");
        }
        self.committed.lock().unwrap().push(records);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 📼 Keeps every event it hears, in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<HarvestEvent>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl HarvestObserver for RecordingObserver {
    fn on_event(&self, event: &HarvestEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
