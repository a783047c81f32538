use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::backends::{FetchOutcome, Fetcher};
use crate::common::Record;

/// 🔧 Config for the in-memory fetcher.
///
/// Leave `documents` out and every ID gets a made-up record. List some and only
/// those IDs exist:
///
/// ```toml
/// [[source_config.InMemory.documents]]
/// id = 2
/// document = { title = "two" }
/// ```
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InMemorySourceConfig {
    #[serde(default)]
    pub documents: Option<Vec<Record>>,
}

/// 📦 The world's most agreeable record API.
///
/// Two moods:
/// - **synthetic**: every ID has a record, and that record is `{"id": <id>}`.
///   Great for dry runs and benches. Terrible for journalism.
/// - **fixed**: serves the documents it was built with; every other ID is
///   [`FetchOutcome::NotFound`].
///
/// Never fails transiently. It has no network to blame.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    // -- None = synthetic mode. Some = the whole universe of records, shared by every clone.
    documents: Option<Arc<HashMap<u64, Value>>>,
}

impl InMemoryFetcher {
    pub fn synthetic() -> Self {
        Self { documents: None }
    }

    pub fn from_config(config: &InMemorySourceConfig) -> Self {
        match config.documents {
            None => Self::synthetic(),
            Some(ref records) => Self::with_documents(
                records
                    .iter()
                    .map(|record| (record.id, record.document.clone())),
            ),
        }
    }

    pub fn with_documents(documents: impl IntoIterator<Item = (u64, Value)>) -> Self {
        Self {
            documents: Some(Arc::new(documents.into_iter().collect())),
        }
    }
}

#[async_trait]
impl Fetcher for InMemoryFetcher {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        match self.documents {
            None => FetchOutcome::Found(Record::new(id, json!({ "id": id }))),
            Some(ref documents) => match documents.get(&id) {
                Some(document) => FetchOutcome::Found(Record::new(id, document.clone())),
                None => FetchOutcome::NotFound,
            },
        }
    }
}
