//! 📦 Common data structures: the building blocks of harvex.
//!
//! 🎬 INT. SOMEWHERE ON THE INTERNET, 3:47 AM. Notice #48213 sits in a database it
//! did not choose, behind an API it does not understand. It has an ID. It has a body.
//! It has no idea a fleet of workers is about to come knocking, one integer at a time.
//!
//! This module holds the humble types that ferry those records from the fetch side to
//! the sink side: [`IdRange`] (what to visit), [`Record`] (what we found), and the
//! worker-private [`RecordBatch`] (what we're about to commit in bulk).
//!
//! 🦆

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// 🎯 The closed interval `[low, high]` of record IDs to harvest.
///
/// An inverted range (`low > high`) is perfectly legal. It just means there is
/// nothing to do, which is also how I feel about Mondays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    /// 📉 First ID to visit, inclusive.
    pub low: u64,
    /// 📈 Last ID to visit, inclusive.
    pub high: u64,
}

impl IdRange {
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// 🔢 Every ID in the range, ascending. `low..=high` handles `high == u64::MAX`
    /// without the off-by-one sadness a half-open range would bring.
    pub fn ids(&self) -> RangeInclusive<u64> {
        self.low..=self.high
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    /// 📏 How many IDs live in here. Saturates for `[0, u64::MAX]`, which has one
    /// more member than a u64 can count. Math is rude like that.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        (self.high - self.low).saturating_add(1)
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// 📄 One fetched record: the ID we asked for and the document that came back.
///
/// The document is opaque JSON. We don't parse it, judge it, or rename its fields.
/// We just carry it to the sink like a very literal mail carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub document: serde_json::Value,
}

impl Record {
    pub fn new(id: u64, document: serde_json::Value) -> Self {
        Self { id, document }
    }
}

// 📐 Upper bound on the up-front allocation. A threshold of a million shouldn't
// reserve a million slots before the first record even shows up.
const MAX_PREALLOCATED_RECORDS: usize = 1024;

/// 🪣 A worker's private bucket of records waiting for a bulk write.
///
/// The bucket never grows past its threshold: the push that reaches it hands the
/// whole batch back and starts over with an empty one. Whatever happens to the
/// handed-back batch afterwards (committed, rejected, cursed) the bucket is already
/// empty, so nothing from it can sneak into a later flush.
#[derive(Debug)]
pub(crate) struct RecordBatch {
    records: Vec<Record>,
    threshold: usize,
}

impl RecordBatch {
    pub(crate) fn new(threshold: usize) -> Self {
        Self {
            records: Vec::with_capacity(threshold.min(MAX_PREALLOCATED_RECORDS)),
            threshold,
        }
    }

    /// 📥 Append a record. Returns the full batch once the threshold is reached.
    pub(crate) fn push(&mut self, record: Record) -> Option<Vec<Record>> {
        self.records.push(record);
        if self.records.len() >= self.threshold {
            Some(self.take())
        } else {
            None
        }
    }

    /// 🗑️ Hand over everything buffered so far and reset to empty.
    pub(crate) fn take(&mut self) -> Vec<Record> {
        std::mem::replace(
            &mut self.records,
            Vec::with_capacity(self.threshold.min(MAX_PREALLOCATED_RECORDS)),
        )
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
