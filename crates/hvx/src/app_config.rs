//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." -- every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use std::path::Path;

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{
    ElasticsearchSinkConfig, FileSinkConfig, HttpFetcherConfig, InMemorySinkConfig,
    InMemorySourceConfig,
};
use crate::common::IdRange;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 🎯 Which IDs to visit, both ends inclusive.
    pub id_range: IdRange,
    /// 🔊 `"debug"` turns the log volume up; anything else keeps it at warnings.
    #[serde(default = "default_run_mode", alias = "runmode")]
    pub run_mode: String,
    /// 🧵 How hard to work.
    #[serde(default, alias = "runtime")]
    pub harvest: HarvestConfig,
    /// 📡 Where records come from. Configurable, unlike my children.
    pub source_config: SourceConfig,
    /// 🕳️ Where records go.
    pub sink_config: SinkConfig,
}

fn default_run_mode() -> String {
    "production".to_string()
}

impl AppConfig {
    /// 🔊 Default log filter for this run mode, used when `RUST_LOG` stays quiet.
    pub fn default_log_filter(&self) -> &'static str {
        if self.run_mode.eq_ignore_ascii_case("debug") {
            "debug"
        } else {
            "warn"
        }
    }
}

/// 🧵 Worker pool knobs.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// 👷 How many workers pull IDs at once. Fixed for the whole run.
    #[serde(default = "default_worker_count", alias = "num_workers")]
    pub worker_count: usize,
    /// 🪣 How many found records a worker collects before one bulk write.
    #[serde(default = "default_batch_size", alias = "flush_threshold")]
    pub batch_size: usize,
}

// 👷 Ten workers. Enough to be busy, few enough that the API doesn't file a restraining order.
fn default_worker_count() -> usize {
    10
}

// 🪣 99 records per bulk write. Not 100. Don't ask. It's tradition now.
fn default_batch_size() -> usize {
    99
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            batch_size: default_batch_size(),
        }
    }
}

impl HarvestConfig {
    /// 🔒 Reject knob settings that can never make progress.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            anyhow::bail!(
                "💀 worker_count is 0. A worker pool with no workers is just a pool. Set it to at least 1."
            );
        }
        if self.batch_size == 0 {
            anyhow::bail!(
                "💀 batch_size is 0. A bucket that holds nothing flushes forever. Set it to at least 1."
            );
        }
        Ok(())
    }
}

/// 🎭 Which fetcher to build.
#[derive(Debug, Deserialize, Clone)]
pub enum SourceConfig {
    Http(HttpFetcherConfig),
    InMemory(InMemorySourceConfig),
}

/// 🎭 Which sink to build.
#[derive(Debug, Deserialize, Clone)]
pub enum SinkConfig {
    Elasticsearch(ElasticsearchSinkConfig),
    File(FileSinkConfig),
    InMemory(InMemorySinkConfig),
}

/// 🎛️ Values from the command line that beat both the file and the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigOverrides {
    pub low: Option<u64>,
    pub high: Option<u64>,
}

/// 🚀 Load the config from env vars, an optional TOML file, and CLI overrides.
///
/// 📐 Layering, weakest first:
///   - `HVX_*` environment variables (`__` separates nesting: `HVX_ID_RANGE__LOW=1`)
///   - the TOML file, if one was given
///   - [`ConfigOverrides`]
///
/// 💀 Returns an error if the merged result doesn't parse. The message says which layer to blame.
pub fn load_config(config_file_name: Option<&Path>, overrides: ConfigOverrides) -> Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("HVX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let config = match overrides.low {
        Some(low) => config.merge(("id_range.low", low)),
        None => config,
    };
    let config = match overrides.high {
        Some(high) => config.merge(("id_range.high", high)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (HVX_*).",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (HVX_*). \
                 No file was provided, so this one's all on the environment."
            .to_string(),
    };

    config.extract().context(context_msg)
}
