//! Core data models used throughout paperdex.
//!
//! These types represent the segments, store entries, and sync plans that flow
//! through the synchronization and ingestion pipeline.

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Metadata key under which a segment's originating file hash is stored.
pub const SOURCE_HASH_KEY: &str = "source_hash";

/// A chunk of document text plus its metadata, as handed to the vector store.
///
/// Chunkers populate `metadata` freely (`page`, `section`); the ingestion
/// pipeline stamps [`SOURCE_HASH_KEY`] on top before storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// The stamped source hash, if present.
    pub fn source_hash(&self) -> Option<&str> {
        self.metadata.get(SOURCE_HASH_KEY).and_then(Value::as_str)
    }
}

/// The `{id, metadata}` projection of a persisted segment, as returned by
/// `VectorStore::get`. Embedding vectors never cross into the core.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub id: String,
    pub metadata: Map<String, Value>,
}

impl StoreEntry {
    /// The hash of the file this entry came from. Entries written by this
    /// tool always carry one; a `None` marks a foreign or damaged entry.
    pub fn source_hash(&self) -> Option<&str> {
        self.metadata.get(SOURCE_HASH_KEY).and_then(Value::as_str)
    }
}

/// The actions needed to bring the store in line with the folder.
///
/// Both sides are sorted, so two plans computed over identical state
/// compare equal. Plans are ephemeral and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Folder files whose content hash is absent from the store.
    pub files_to_add: Vec<PathBuf>,
    /// Entry ids whose source hash no longer matches any folder file.
    pub entry_ids_to_remove: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.files_to_add.is_empty() && self.entry_ids_to_remove.is_empty()
    }
}

/// One file successfully pushed into the store.
#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub path: PathBuf,
    pub hash: String,
    pub segments: usize,
}

/// One file that failed somewhere between hashing and storage.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an ingest batch. Failures never abort the batch; they are
/// collected here and reported afterwards.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub ingested: Vec<IngestedFile>,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn total_segments(&self) -> usize {
        self.ingested.iter().map(|f| f.segments).sum()
    }
}
