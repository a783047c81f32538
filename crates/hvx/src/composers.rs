//! 🎬 *[the batch is full. the sink hungers. somebody has to write the payload.]*
//!
//! 🎼 The Composers module: turning a batch of [`Record`]s into the exact bytes a
//! sink puts on the wire.
//!
//! 🧠 Knowledge graph:
//! - **NDJSON** (`NdjsonComposer`): one serialized `Record` per line. Used by the file sink.
//! - **Elasticsearch bulk** (`ElasticsearchBulkComposer`): action line + document line
//!   per record, `_id` pinned to the record ID. Used by the Elasticsearch sink.
//! - Sinks stay I/O only: compose first, then send. Ancient proverb: "He who formats
//!   inside the HTTP call, debugs the HTTP call."
//!
//! 🦆 (the duck composes... symphonies? payloads? both? the duck has no comment.)

use anyhow::{Context, Result};
use serde_json::json;

use crate::common::Record;

/// 🎼 Assembles a batch of records into a single wire-format payload.
pub(crate) trait Composer: std::fmt::Debug {
    fn compose(&self, records: &[Record]) -> Result<String>;
}

// ===== NDJSON Composer =====

/// 📡 Newline-Delimited JSON: `record\nrecord\n`.
///
/// What's the DEAL with NDJSON? It's JSON but unfriendly. Every line is lonely.
/// No brackets to hold them. No commas to connect them. Just newlines. And silence.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NdjsonComposer;

impl Composer for NdjsonComposer {
    fn compose(&self, records: &[Record]) -> Result<String> {
        let mut payload = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .with_context(|| format!("💀 Record {} refused to become JSON", record.id))?;
            payload.push_str(&line);
            payload.push('\n');
        }
        Ok(payload)
    }
}

// ===== Elasticsearch Bulk Composer =====

/// 📦 The `_bulk` dialect: `{"index":{...}}\n{document}\n` per record.
///
/// The record ID becomes the document `_id`, so the same record harvested twice
/// lands on the same document instead of cloning itself across the index.
#[derive(Debug, Clone)]
pub(crate) struct ElasticsearchBulkComposer {
    index: String,
}

impl ElasticsearchBulkComposer {
    pub(crate) fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
        }
    }
}

impl Composer for ElasticsearchBulkComposer {
    fn compose(&self, records: &[Record]) -> Result<String> {
        let mut payload = String::new();
        for record in records {
            let action = json!({ "index": { "_index": self.index, "_id": record.id.to_string() } });
            payload.push_str(&action.to_string());
            payload.push('\n');
            // -- ⚠️ serde_json::Value renders compact, so no stray newline can split a document
            // -- across two bulk lines. The bulk API would have words about that.
            let document = serde_json::to_string(&record.document).with_context(|| {
                format!("💀 Document for record {} refused to become JSON", record.id)
            })?;
            payload.push_str(&document);
            payload.push('\n');
        }
        // ✅ Trailing \n included. `_bulk` demands it, nobody complains.
        Ok(payload)
    }
}
