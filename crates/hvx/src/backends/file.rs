//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The disk was quiet. Too quiet. Ten workers were about to write to the same
//! file at the same time, and every one of them thought it was the main character.
//!
//! This module is the file sink: every flush becomes a run of NDJSON lines appended
//! to one output file, written in a single go under a lock, so two workers' batches
//! can sit next to each other but never inside each other.
//!
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

mod file_sink;

pub use file_sink::{FileSink, FileSinkConfig};
