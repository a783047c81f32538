//! 🎟️ The ID handoff: one integer per outstretched hand, in order, no seconds.
//!
//! The supervisor owns the [`IdFeeder`] and walks the range; every worker holds a
//! clone of the [`IdSource`] and asks for the next ID whenever it's free. The
//! channel between them is multi-consumer and bounded, so:
//! - each ID goes to exactly one worker (the channel hands a message to one receiver),
//! - the feeder waits whenever nobody is ready to take the next one,
//! - dropping the feeder is the "that's all, folks" signal every worker sees.
//!
//! ⚠️ Not a strict rendezvous. While every worker is busy, one already-produced ID
//! waits in the channel's single slot, so the feeder runs at most one ID ahead. The
//! ID is still delivered exactly once, just slightly early.

use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};

use crate::common::IdRange;

// 🎯 async-channel won't build a zero-capacity (rendezvous) channel, so one slot is as
// close as it gets: the feeder can be at most one ID ahead of the workers.
const HANDOFF_CAPACITY: usize = 1;

/// 🏗️ Build a connected feeder/source pair.
pub(crate) fn handoff() -> (IdFeeder, IdSource) {
    let (tx, rx) = async_channel::bounded(HANDOFF_CAPACITY);
    (IdFeeder { tx }, IdSource { rx })
}

/// 📤 The producing end. Consumed by [`IdFeeder::feed`], so exhaustion can only be
/// signalled once, after the last ID.
#[derive(Debug)]
pub(crate) struct IdFeeder {
    tx: Sender<u64>,
}

impl IdFeeder {
    /// 🚚 Hand every ID in the range to whichever worker asks next, lowest first.
    ///
    /// Returns how many IDs were handed off. Closes the channel on the way out,
    /// which is how the workers learn there's nothing left.
    pub(crate) async fn feed(self, id_range: IdRange) -> Result<u64> {
        let mut handed_off = 0u64;
        for id in id_range.ids() {
            self.tx.send(id).await.with_context(|| {
                format!(
                    "💀 Could not hand off ID {}: every worker has already left the building",
                    id
                )
            })?;
            handed_off += 1;
        }
        // -- 🔚 self drops here, tx with it, and every idle recv() wakes up to an empty, closed channel
        Ok(handed_off)
    }
}

/// 📥 The consuming end. Clone it once per worker.
#[derive(Debug, Clone)]
pub(crate) struct IdSource {
    rx: Receiver<u64>,
}

impl IdSource {
    /// ⏳ The next undelivered ID, or `None` once the range is exhausted.
    pub(crate) async fn next_id(&self) -> Option<u64> {
        self.rx.recv().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_one_where_every_id_goes_to_exactly_one_consumer() -> Result<()> {
        let (feeder, source) = handoff();
        let consumers: Vec<_> = (0..8)
            .map(|_| {
                let source = source.clone();
                tokio::spawn(async move {
                    let mut mine = Vec::new();
                    while let Some(id) = source.next_id().await {
                        mine.push(id);
                        tokio::task::yield_now().await;
                    }
                    mine
                })
            })
            .collect();
        drop(source);

        let handed_off = feeder.feed(IdRange::new(1, 1000)).await?;
        assert_eq!(handed_off, 1000);

        let mut everything = Vec::new();
        for consumer in consumers {
            let mine = consumer.await?;
            // 🧪 a single consumer sees its IDs in increasing order
            assert!(mine.windows(2).all(|pair| pair[0] < pair[1]));
            everything.extend(mine);
        }
        assert_eq!(everything.len(), 1000, "no duplicates, no omissions");
        let unique: BTreeSet<u64> = everything.into_iter().collect();
        assert_eq!(unique, (1..=1000).collect::<BTreeSet<u64>>());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_inverted_range_closes_immediately() -> Result<()> {
        let (feeder, source) = handoff();
        assert_eq!(feeder.feed(IdRange::new(5, 1)).await?, 0);
        assert_eq!(source.next_id().await, None);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_feeder_waits_for_a_free_hand() -> Result<()> {
        let (feeder, source) = handoff();
        let feeding = tokio::spawn(feeder.feed(IdRange::new(1, 3)));

        // 🧪 with one slot and nobody pulling, the feeder parks after the first ID
        tokio::task::yield_now().await;
        assert!(!feeding.is_finished());

        assert_eq!(source.next_id().await, Some(1));
        assert_eq!(source.next_id().await, Some(2));
        assert_eq!(source.next_id().await, Some(3));
        assert_eq!(source.next_id().await, None);
        assert_eq!(feeding.await??, 3);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_nobody_is_left_to_take_ids() {
        let (feeder, source) = handoff();
        drop(source);
        assert!(feeder.feed(IdRange::new(1, 10)).await.is_err());
    }
}
