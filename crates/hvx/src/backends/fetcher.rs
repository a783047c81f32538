use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::SourceConfig;
use crate::backends::{http, in_mem};
use crate::common::Record;

/// 🎣 What came back when we asked for one ID.
///
/// `NotFound` and `TransientError` both mean "skip it", but they are not the same
/// kind of skip: an empty slot in the ID space is normal, a failed request is
/// something a human may want to hear about.
#[derive(Debug)]
pub enum FetchOutcome {
    Found(Record),
    NotFound,
    TransientError(anyhow::Error),
}

/// 🚰 Fetches a single record by ID.
///
/// # Contract 📜
/// - Classify "no record at this ID" as [`FetchOutcome::NotFound`], structurally.
///   No sniffing error strings.
/// - Never retry internally. A failed ID stays failed for the run.
/// - `&self`, because every worker shares one fetcher and calls it concurrently.
#[async_trait]
pub trait Fetcher: std::fmt::Debug + Send + Sync {
    async fn fetch(&self, id: u64) -> FetchOutcome;
}

/// 🎭 The many faces of a Fetcher, dispatched by enum so the supervisor never has
/// to care whether records come over HTTP or out of thin RAM.
#[derive(Debug)]
pub enum FetcherBackend {
    Http(http::HttpFetcher),
    InMemory(in_mem::InMemoryFetcher),
}

impl FetcherBackend {
    /// 🏗️ Build the fetcher the config asks for.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        match config {
            SourceConfig::Http(http_config) => {
                Ok(Self::Http(http::HttpFetcher::new(http_config.clone())?))
            }
            SourceConfig::InMemory(in_mem_config) => Ok(Self::InMemory(
                in_mem::InMemoryFetcher::from_config(in_mem_config),
            )),
        }
    }
}

#[async_trait]
impl Fetcher for FetcherBackend {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        match self {
            FetcherBackend::Http(fetcher) => fetcher.fetch(id).await,
            FetcherBackend::InMemory(fetcher) => fetcher.fetch(id).await,
        }
    }
}
