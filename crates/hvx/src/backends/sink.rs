use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::SinkConfig;
use crate::backends::{elasticsearch, file, in_mem};
use crate::common::Record;

/// 🕳️ A sink that commits records in bulk.
///
/// The drain at the bottom of the pipeline tub. Every worker holds the same sink and
/// flushes into it whenever its batch fills up, so flushes from different workers
/// can and will overlap.
///
/// # Contract 📜
/// - `bulk_write` commits exactly the records passed, in order, as one call.
///   It either works for the whole batch or returns `Err` for the whole batch.
/// - Concurrent `bulk_write` calls must be safe without any locking by the caller.
///   If the sink needs a lock, it brings its own.
/// - `close` releases whatever the sink holds. Call it once the harvest is done.
#[async_trait]
pub trait Sink: std::fmt::Debug + Send + Sync {
    async fn bulk_write(&self, records: Vec<Record>) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

/// 🎭 The many faces of a Sink. Mirrors [`FetcherBackend`](super::FetcherBackend)
/// on the other end of the pipeline, because symmetry is a love language.
#[derive(Debug)]
pub enum SinkBackend {
    Elasticsearch(elasticsearch::ElasticsearchSink),
    File(file::FileSink),
    InMemory(in_mem::InMemorySink),
}

impl SinkBackend {
    /// 🏗️ Connect to whatever the config points at. Connectivity problems surface
    /// here, before a single ID has been handed out.
    pub async fn from_config(config: &SinkConfig) -> Result<Self> {
        match config {
            SinkConfig::Elasticsearch(es_config) => Ok(Self::Elasticsearch(
                elasticsearch::ElasticsearchSink::new(es_config.clone()).await?,
            )),
            SinkConfig::File(file_config) => {
                Ok(Self::File(file::FileSink::new(file_config.clone()).await?))
            }
            SinkConfig::InMemory(_) => Ok(Self::InMemory(in_mem::InMemorySink::new())),
        }
    }
}

#[async_trait]
impl Sink for SinkBackend {
    async fn bulk_write(&self, records: Vec<Record>) -> Result<()> {
        match self {
            SinkBackend::Elasticsearch(sink) => sink.bulk_write(records).await,
            SinkBackend::File(sink) => sink.bulk_write(records).await,
            SinkBackend::InMemory(sink) => sink.bulk_write(records).await,
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            SinkBackend::Elasticsearch(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
            SinkBackend::InMemory(sink) => sink.close().await,
        }
    }
}
