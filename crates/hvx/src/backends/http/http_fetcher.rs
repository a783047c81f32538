use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backends::{FetchOutcome, Fetcher};
use crate::common::Record;

// 🎯 Where the ID goes in the URL template.
const ID_PLACEHOLDER: &str = "{id}";

// 🔒 The header the notice API wants its token in. Not `Authorization`, because
// standards are more like guidelines.
const AUTH_TOKEN_HEADER: &str = "X-Authentication-Token";

// ✂️ Error bodies can be whole HTML pages. Nobody needs the whole HTML page in a log line.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// 📡 How to reach the record API.
#[derive(Debug, Deserialize, Clone)]
pub struct HttpFetcherConfig {
    /// 🗺️ URL with an `{id}` placeholder, e.g. `https://lumendatabase.org/notices/{id}.json`.
    pub url_template: String,
    /// 🔒 Optional API token. The bouncer may or may not check the list.
    #[serde(default)]
    pub api_token: Option<String>,
    /// ⏱️ Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// ⏱️ Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// 🎣 Fetches one record per ID over HTTP.
///
/// Holds a single `reqwest::Client` (a connection pool wearing a trench coat) that
/// every worker shares. 2xx with a JSON body is a record, 404 is an empty slot,
/// and everything else is a transient error that nobody retries.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self> {
        if !config.url_template.contains(ID_PLACEHOLDER) {
            anyhow::bail!(
                "💀 url_template '{}' has no '{}' placeholder. Every ID would fetch the same URL, \
                 which is a very efficient way to download one record thousands of times.",
                config.url_template,
                ID_PLACEHOLDER
            );
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. Probably TLS. It's always TLS.")?;

        debug!("🌐 HTTP fetcher ready: {}", config.url_template);
        Ok(Self { client, config })
    }

    fn url_for(&self, id: u64) -> String {
        self.config
            .url_template
            .replace(ID_PLACEHOLDER, &id.to_string())
    }

    /// 📡 One GET. `Ok(None)` means 404, the only answer that isn't an error or a record.
    async fn request_record(&self, id: u64) -> Result<Option<Record>> {
        let url = self.url_for(id);
        let mut request = self.client.get(&url).header(ACCEPT, "application/json");
        if let Some(ref token) = self.config.api_token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("💀 GET {} never got an answer back", url))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            anyhow::bail!(
                "💀 GET {} answered '{}'. The body read: '{}'",
                url,
                status,
                body_excerpt
            );
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("💀 GET {} hung up halfway through the body", url))?;
        let document: serde_json::Value = serde_json::from_str(&body)
            .with_context(|| format!("💀 GET {} returned something that is not JSON", url))?;

        trace!("📄 fetched record {} ({} bytes)", id, body.len());
        Ok(Some(Record::new(id, document)))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        match self.request_record(id).await {
            Ok(Some(record)) => FetchOutcome::Found(record),
            Ok(None) => FetchOutcome::NotFound,
            Err(err) => FetchOutcome::TransientError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> HttpFetcherConfig {
        HttpFetcherConfig {
            url_template: format!("{}/notices/{{id}}.json", server.uri()),
            api_token: None,
            timeout_secs: 5,
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn the_one_where_a_template_without_a_placeholder_is_rejected() {
        let config = HttpFetcherConfig {
            url_template: "https://example.invalid/notices/latest.json".into(),
            api_token: None,
            timeout_secs: 5,
            connect_timeout_secs: 5,
        };
        let err = HttpFetcher::new(config).expect_err("💀 no placeholder should not construct");
        assert!(err.to_string().contains("{id}"));
    }

    #[tokio::test]
    async fn the_one_where_a_200_becomes_a_record() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/7.json"))
            .and(header("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "title": "takedown" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(config_for(&server))?;
        match fetcher.fetch(7).await {
            FetchOutcome::Found(record) => {
                assert_eq!(record.id, 7);
                assert_eq!(record.document["title"], "takedown");
            }
            other => panic!("💀 expected Found, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_404_is_just_an_empty_slot() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/8.json"))
            .respond_with(ResponseTemplate::new(404).set_body_string("StatusCode: 404 Not Found"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(config_for(&server))?;
        assert!(matches!(fetcher.fetch(8).await, FetchOutcome::NotFound));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_500_is_a_transient_error_with_context() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/9.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream is napping"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(config_for(&server))?;
        match fetcher.fetch(9).await {
            FetchOutcome::TransientError(err) => {
                let message = format!("{err:#}");
                assert!(message.contains("503"), "status should be in: {message}");
                assert!(message.contains("upstream is napping"), "body should be in: {message}");
            }
            other => panic!("💀 expected TransientError, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_garbage_json_is_not_a_record() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/10.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>surprise</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(config_for(&server))?;
        assert!(matches!(
            fetcher.fetch(10).await,
            FetchOutcome::TransientError(_)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_token_rides_along_in_its_header() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/11.json"))
            .and(header(AUTH_TOKEN_HEADER, "sekrit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 11 })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.api_token = Some("sekrit".into());
        let fetcher = HttpFetcher::new(config)?;
        assert!(matches!(fetcher.fetch(11).await, FetchOutcome::Found(_)));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_nobody_is_listening() -> Result<()> {
        // 🧪 Port 1 on localhost: reserved, unloved, and reliably refusing connections.
        let fetcher = HttpFetcher::new(HttpFetcherConfig {
            url_template: "http://127.0.0.1:1/notices/{id}.json".into(),
            api_token: None,
            timeout_secs: 2,
            connect_timeout_secs: 2,
        })?;
        assert!(matches!(
            fetcher.fetch(1).await,
            FetchOutcome::TransientError(_)
        ));
        Ok(())
    }
}
