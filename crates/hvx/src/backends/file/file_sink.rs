use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::backends::Sink;
use crate::common::Record;
use crate::composers::{Composer, NdjsonComposer};

// -- 🚰 FileSinkConfig. Lives right next to its FileSink bestie. One backend, one config, one file.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSinkConfig {
    pub file_name: String,
    /// 📎 Keep whatever the file already holds and add to the end. Default: start fresh.
    #[serde(default)]
    pub append: bool,
}

/// 📂 Writes each flushed batch as NDJSON lines into one file.
///
/// The `Mutex` makes every batch a single uninterrupted `write_all`, so concurrent
/// flushes line up one after another instead of shuffling their lines together.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
    file_name: String,
    composer: NdjsonComposer,
}

impl FileSink {
    pub async fn new(config: FileSinkConfig) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.file_name)
            .await
            .with_context(|| {
                format!(
                    "💀 Could not open '{}' for writing. The file exists in our hearts, but apparently not on disk.",
                    config.file_name
                )
            })?;

        debug!("📂 File sink writing to '{}'", config.file_name);
        Ok(Self {
            file: Mutex::new(file),
            file_name: config.file_name,
            composer: NdjsonComposer,
        })
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn bulk_write(&self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        // -- 🎼 compose outside the lock; only the write itself needs to be exclusive
        let payload = self.composer.compose(&records)?;
        let mut file = self.file.lock().await;
        file.write_all(payload.as_bytes())
            .await
            .with_context(|| format!("💀 Failed to write {} records to '{}'", records.len(), self.file_name))?;
        // -- ⏳ tokio hands write_all to the blocking pool and returns early; flush waits for it,
        // -- so a failed write is charged to this batch and not the next one
        file.flush()
            .await
            .with_context(|| format!("💀 {} records never made it into '{}'", records.len(), self.file_name))?;
        trace!("📝 wrote {} records ({} bytes)", records.len(), payload.len());
        Ok(())
    }

    /// 🗑️ Flush and fsync. Skip this and the last batch lives in limbo.
    async fn close(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.flush()
            .await
            .with_context(|| format!("💀 Failed to flush '{}'", self.file_name))?;
        file.sync_all()
            .await
            .with_context(|| format!("💀 Failed to sync '{}' to disk", self.file_name))?;
        debug!("🗑️ File sink closed: '{}'", self.file_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(ids: impl IntoIterator<Item = u64>) -> Vec<Record> {
        ids.into_iter()
            .map(|id| Record::new(id, json!({ "id": id })))
            .collect()
    }

    fn ids_in(contents: &str) -> Vec<u64> {
        contents
            .lines()
            .map(|line| {
                serde_json::from_str::<Record>(line)
                    .expect("💀 every line should be a Record")
                    .id
            })
            .collect()
    }

    #[tokio::test]
    async fn the_one_where_concurrent_batches_never_interleave() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.ndjson");
        let sink = FileSink::new(FileSinkConfig {
            file_name: path.to_string_lossy().into_owned(),
            append: false,
        })
        .await?;

        let (first, second) = tokio::join!(
            sink.bulk_write(records(1..=3)),
            sink.bulk_write(records(10..=12))
        );
        first?;
        second?;
        sink.close().await?;

        let ids = ids_in(&tokio::fs::read_to_string(&path).await?);
        assert!(
            ids == vec![1, 2, 3, 10, 11, 12] || ids == vec![10, 11, 12, 1, 2, 3],
            "each batch should be contiguous, got {ids:?}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_append_keeps_the_old_stuff() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.ndjson");
        let file_name = path.to_string_lossy().into_owned();

        let sink = FileSink::new(FileSinkConfig {
            file_name: file_name.clone(),
            append: false,
        })
        .await?;
        sink.bulk_write(records([1])).await?;
        sink.close().await?;

        let sink = FileSink::new(FileSinkConfig {
            file_name: file_name.clone(),
            append: true,
        })
        .await?;
        sink.bulk_write(records([2])).await?;
        sink.close().await?;
        assert_eq!(ids_in(&tokio::fs::read_to_string(&path).await?), vec![1, 2]);

        // 🧪 and without append, the slate is wiped
        let sink = FileSink::new(FileSinkConfig {
            file_name,
            append: false,
        })
        .await?;
        sink.bulk_write(records([3])).await?;
        sink.close().await?;
        assert_eq!(ids_in(&tokio::fs::read_to_string(&path).await?), vec![3]);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn the_one_where_a_full_disk_fails_the_batch_that_hit_it() -> Result<()> {
        let sink = FileSink::new(FileSinkConfig {
            file_name: "/dev/full".into(),
            append: false,
        })
        .await?;

        let first = sink.bulk_write(records([1])).await;
        assert!(first.is_err(), "batch 1 never reached the disk, so it must not report Ok");
        let second = sink.bulk_write(records([2])).await;
        assert!(second.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_directory_does_not_exist() {
        let result = FileSink::new(FileSinkConfig {
            file_name: "/definitely/not/a/real/dir/out.ndjson".into(),
            append: false,
        })
        .await;
        assert!(result.is_err());
    }
}
