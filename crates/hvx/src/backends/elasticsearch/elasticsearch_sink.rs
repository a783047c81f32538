use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backends::Sink;
use crate::common::Record;
use crate::composers::{Composer, ElasticsearchBulkComposer};

/// 📡 Where the records go, and who we claim to be when we get there.
#[derive(Debug, Deserialize, Clone)]
pub struct ElasticsearchSinkConfig {
    /// 📡 Cluster URL, scheme and port included. Yes, all of it.
    pub url: String,
    /// 📦 The index every record lands in.
    pub index: String,
    /// 🔒 Username. The bouncer at the club. Except the club is a database.
    #[serde(default)]
    pub username: Option<String>,
    /// 🔒 Password. "password123" is not a password. It is a confession.
    #[serde(default)]
    pub password: Option<String>,
    /// 🔒 API key, the velvet rope variant of authentication. Wins over basic auth.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// 📡 The storage sink: one `_bulk` POST per flush.
///
/// Holds a `reqwest::Client`, which is a connection pool that is happy to be
/// shared, so concurrent flushes from every worker go straight through with no
/// lock on our side.
///
/// Knock knock. Who's there? HTTP POST. HTTP POST who? HTTP POST your NDJSON
/// and hope the cluster's in a good mood.
#[derive(Debug)]
pub struct ElasticsearchSink {
    client: reqwest::Client,
    sink_config: ElasticsearchSinkConfig,
    composer: ElasticsearchBulkComposer,
}

/// 🧾 The part of a `_bulk` response we care about: did any item fail?
#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
}

impl ElasticsearchSink {
    /// 🚀 Dial the cluster and make sure the index is real.
    ///
    /// 1. Builds the `reqwest::Client` (10s connect, 30s overall). We will wait, but not forever.
    /// 2. Pings the cluster root. A handshake. A "are you even there?"
    /// 3. Checks the target index exists, because finding out 10,000 records deep is a
    ///    skill issue we'd rather catch at startup.
    pub async fn new(config: ElasticsearchSinkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("💀 The HTTP client refused to be born. The TLS stack wept. The architect shrugged.")?;

        let sink = Self {
            composer: ElasticsearchBulkComposer::new(config.index.clone()),
            sink_config: config,
            client,
        };

        // -- 📡 Connectivity ping. "Hello? Is this thing on?" -- a developer, gesturing at a cluster.
        let root_url = sink.sink_config.url.clone();
        let response = sink
            .authorize(sink.client.get(&root_url))
            .send()
            .await
            .with_context(|| format!("💀 Could not reach Elasticsearch at '{}'. The cluster is giving us the silent treatment.", root_url))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "💀 Elasticsearch at '{}' answered the ping with '{}'. Check the URL and the credentials.",
                root_url,
                response.status()
            );
        }

        // 🔒 Index existence check. Indexing into a nonexistent index is chaos. We are order.
        let index_url = sink.url_for(&sink.sink_config.index);
        let response = sink
            .authorize(sink.client.get(&index_url))
            .send()
            .await
            .context("💀 Reached out to check if the index exists. Got ghosted.")?;
        if !response.status().is_success() {
            anyhow::bail!(
                "💀 Index '{}' does not exist, as far as we can tell. We knocked. The door remained unanswered.",
                index_url
            );
        }
        debug!("✅ Index exists and is accepting visitors: {}", index_url);

        Ok(sink)
    }

    fn url_for(&self, suffix: &str) -> String {
        format!("{}/{}", self.sink_config.url.trim_end_matches('/'), suffix)
    }

    /// 🔒 Auth priority: API key wins over basic auth. This is not a democracy.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.sink_config.api_key {
            request.header("Authorization", format!("ApiKey {}", api_key))
        } else if let Some(ref username) = self.sink_config.username {
            request.basic_auth(username, self.sink_config.password.as_ref())
        } else {
            request
        }
    }

    /// 📡 Fires one `_bulk` POST. Does not retry. Retries are somebody else's problem,
    /// and in this codebase that somebody does not exist.
    async fn submit_bulk_request(&self, request_body: String, record_count: usize) -> Result<()> {
        let bulk_url = self.url_for("_bulk");
        let response = self
            .authorize(self.client.post(&bulk_url))
            // ⚠️ application/x-ndjson, not application/json. Elasticsearch cares. Deeply.
            .header("Content-Type", "application/x-ndjson")
            .body(request_body)
            .send()
            .await
            .context("💀 The bulk request never made it to Elasticsearch. Check connectivity, timeouts, and your feelings.")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!(
                "💀 Elasticsearch looked at our {} records and said '{}'. The response read: '{}'",
                record_count,
                status,
                body
            );
        }

        // -- 🕵️ A 200 can still carry per-item rejections. The batch is all-or-nothing for
        // -- our bookkeeping, so any rejected item fails the whole flush.
        let verdict: BulkResponse = serde_json::from_str(&body)
            .context("💀 Elasticsearch said 200 but the body was not a bulk response")?;
        if verdict.errors {
            anyhow::bail!(
                "💀 Elasticsearch accepted the request but rejected items among our {} records: '{}'",
                record_count,
                body
            );
        }

        trace!("🚀 Bulk request of {} records landed", record_count);
        Ok(())
    }
}

#[async_trait]
impl Sink for ElasticsearchSink {
    async fn bulk_write(&self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let payload = self.composer.compose(&records)?;
        debug!(
            "📡 Sending {} records ({} bytes) to /_bulk",
            records.len(),
            payload.len()
        );
        self.submit_bulk_request(payload, records.len())
            .await
            .context("💀 The bulk submission stumbled at the finish line.")
    }

    /// 🗑️ Nothing to flush. The HTTP client drops cleanly, the pool says goodbye.
    async fn close(&self) -> Result<()> {
        debug!("🗑️ Elasticsearch sink closing, no buffer to flush, just vibes to release");
        Ok(())
    }
}
