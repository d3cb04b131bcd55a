//! Lexicam
//!
//! Camera object detection for vocabulary learning: frames are pulled from a
//! source, run through an opaque detector, cleaned up by a deterministic
//! post-processing pipeline and offered to the learner as English words.
//!
//! # Module Structure
//!
//! - `frame`, `ingest`: raw frames and the sources that produce them
//! - `detect`: detection types, detector backends and their registry
//! - `postprocess`: confidence/size filter, suppression, per-category cap
//! - `alias`: learner-facing display labels for categories
//! - `scheduler`: periodic detection with a single-flight busy guard
//! - `session`: committed detections, status line and word selection
//! - `vocab`, `storage`: the saved word list and its key-value store
//! - `dictionary`: English definitions and pronunciation lookup
//! - `config`: daemon configuration (file + environment)

use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod alias;
pub mod config;
pub mod detect;
pub mod dictionary;
pub mod frame;
pub mod ingest;
pub mod postprocess;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod vocab;

pub use alias::AliasTable;
pub use detect::{
    BackendRegistry, BoundingBox, Detection, DetectorBackend, SharedBackend,
    StubBackend,
};
pub use dictionary::{DictionaryClient, WordDetails};
pub use frame::RawFrame;
pub use ingest::{open_source, FrameSource, SourceStats, SyntheticSource};
pub use postprocess::{postprocess, PostprocessConfig};
pub use scheduler::{CycleContext, DetectionScheduler, SchedulerStats};
pub use session::{CycleError, CycleOutcome, DetectionSession, SharedSession};
pub use storage::{InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore};
pub use vocab::{Vocabulary, VocabularyEntry, VOCABULARY_KEY};

pub(crate) fn now_s() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
