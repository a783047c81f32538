//! # Previously, on Harvex...
//!
//! 🎬 The network was down. The cluster was down. Morale was down. Someone still
//! had to prove the pipeline worked. So they built a backend that lives entirely in
//! RAM, gone the moment you blink.
//!
//! `in_mem` provides an in-memory [`Fetcher`](super::Fetcher) and
//! [`Sink`](super::Sink) for tests, benches, and dry runs. The
//! [`InMemoryFetcher`] either makes up a tiny document for every ID or serves a
//! fixed set of documents. The [`InMemorySink`] keeps every flush it receives behind
//! an `Arc<Mutex<...>>` so callers can inspect exactly what arrived, batch by batch.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. If you're deploying this to prod, please also
//! deploy a therapist.

mod in_mem_fetcher;
mod in_mem_sink;

pub use in_mem_fetcher::{InMemoryFetcher, InMemorySourceConfig};
pub use in_mem_sink::{InMemorySink, InMemorySinkConfig};
