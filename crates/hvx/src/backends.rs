//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Fetchers pull one record per ID out of somewhere, Sinks commit records in bulk
//! to somewhere else. And in between, we panic! (kidding, we use anyhow)
//!
//! 🎭 This module is the casting agency. Need records from an HTTP API? Out of thin
//! RAM? Need them in Elasticsearch, a file, or a Vec you can poke at in a test?
//! We've got a backend for that.
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls → `*Backend` enum dispatcher → `from_config` resolver
//! - [`Fetcher`] / [`FetcherBackend`]: `fetch(id) → FetchOutcome`
//! - [`Sink`] / [`SinkBackend`]: `bulk_write(records) → Result<()>`, concurrent-safe
//! - Payload formatting lives in `composers`, not here. Sinks do I/O. Just I/O.
//!
//! 🦆 The duck is here because every file must have one. This is law.

pub mod elasticsearch;
mod fetcher;
pub mod file;
pub mod http;
pub mod in_mem;
mod sink;

pub use elasticsearch::{ElasticsearchSink, ElasticsearchSinkConfig};
pub use fetcher::{FetchOutcome, Fetcher, FetcherBackend};
pub use file::{FileSink, FileSinkConfig};
pub use http::{HttpFetcher, HttpFetcherConfig};
pub use in_mem::{InMemoryFetcher, InMemorySink, InMemorySinkConfig, InMemorySourceConfig};
pub use sink::{Sink, SinkBackend};
