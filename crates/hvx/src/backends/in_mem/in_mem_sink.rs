use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::backends::Sink;
use crate::common::Record;

/// 🔧 Config marker for the in-memory sink. Nothing to configure. Nowhere to go.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InMemorySinkConfig {}

/// 📦 A sink that never forgets. Unlike my dad, who forgot my soccer game in 1998.
///
/// Every `bulk_write` lands as its own entry, so callers can see not just *what*
/// arrived but *how it was batched*.
///
/// Clone-able because tests need to peek inside after handing a copy off to the
/// pipeline. The `Arc` means everyone shares the same Vec. The borrow checker
/// approved. Barely. It had notes.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    // 🔒 The evidence locker. One entry per bulk write, in arrival order.
    received: Arc<Mutex<Vec<Vec<Record>>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 📋 Every batch received so far, oldest first.
    pub async fn flushes(&self) -> Vec<Vec<Record>> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn bulk_write(&self, records: Vec<Record>) -> Result<()> {
        // 🔒 The Mutex is load-bearing. Do not remove. I know it looks optional. It isn't.
        self.received.lock().await.push(records);
        Ok(())
    }

    /// 🗑️ Nothing to close. We live in RAM. The vibes are ref-counted.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn the_one_where_each_bulk_write_stays_its_own_batch() -> Result<()> {
        let sink = InMemorySink::new();
        let peek = sink.clone();

        sink.bulk_write(vec![Record::new(1, json!({})), Record::new(2, json!({}))])
            .await?;
        sink.bulk_write(vec![Record::new(3, json!({}))]).await?;
        sink.close().await?;

        let flushes = peek.flushes().await;
        assert_eq!(flushes.len(), 2);
        assert_eq!(flushes[0].len(), 2);
        assert_eq!(flushes[1][0].id, 3);
        Ok(())
    }
}
