//! # 📡 THE ELASTICSEARCH BACKEND
//!
//! *Previously, on Harvex...*
//!
//! 🎬 COLD OPEN, INT. SERVER ROOM, 3:47 AM
//!
//! Ten workers, ten half-full buckets, one cluster. Every few seconds one of the
//! buckets tips over and ninety-nine records go flying at `/_bulk`. The cluster
//! catches them. Usually. When it doesn't, we write it down and keep going,
//! because the next ID is already waiting.
//!
//! 🚀 This module is the storage sink: it dials the cluster, checks the target index
//! exists, and then fires one `_bulk` request per flush. It does not retry. It does
//! not buffer. It does not judge.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

mod elasticsearch_sink;

pub use elasticsearch_sink::{ElasticsearchSink, ElasticsearchSinkConfig};
