//! Vector store abstraction.
//!
//! The [`VectorStore`] trait defines everything the sync, ingest, and ask
//! pipelines need from the vector index. The store owns persistence,
//! embedding computation, and similarity ranking; the rest of the crate only
//! ever sees segment text, metadata, and entry ids.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`add`](VectorStore::add) | Persist a batch of segments under caller-chosen ids |
//! | [`get`](VectorStore::get) | List stored entries as `{id, metadata}` projections |
//! | [`delete`](VectorStore::delete) | Remove entries by id |
//! | [`query`](VectorStore::query) | Retrieve the segments most similar to a question |

pub mod chroma;
pub mod memory;

use async_trait::async_trait;

use crate::models::{Segment, StoreEntry};

/// A single metadata equality constraint for [`VectorStore::get`].
#[derive(Debug, Clone)]
pub struct EntryFilter {
    pub key: String,
    pub value: serde_json::Value,
}

impl EntryFilter {
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Store failure, kept distinct from local I/O and extraction errors so
/// callers can tell "server unavailable" apart from "bad file".
#[derive(Debug)]
pub enum StoreError {
    /// The server could not be reached at all (connect failure, timeout).
    Unreachable(String),
    /// The server answered with a non-success status.
    Api { status: u16, message: String },
    /// The server answered 2xx but the body did not have the expected shape.
    InvalidResponse(String),
    /// The embedding backend failed while the store was computing vectors.
    Embedding(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unreachable(e) => write!(f, "vector store unreachable: {}", e),
            StoreError::Api { status, message } => {
                write!(f, "vector store API error {}: {}", status, message)
            }
            StoreError::InvalidResponse(e) => {
                write!(f, "unexpected vector store response: {}", e)
            }
            StoreError::Embedding(e) => write!(f, "embedding failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Abstract vector index backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist `segments` under the given ids, embeddings included.
    ///
    /// `ids` and `segments` are parallel slices. The ingest pipeline issues
    /// exactly one `add` per source file, so a file is either fully stored
    /// or not stored at all.
    async fn add(&self, ids: &[String], segments: &[Segment]) -> Result<(), StoreError>;

    /// List stored entries, optionally narrowed by a metadata filter.
    ///
    /// Returns the complete result set; implementations page internally
    /// when the backend limits page sizes.
    async fn get(&self, filter: Option<&EntryFilter>) -> Result<Vec<StoreEntry>, StoreError>;

    /// Remove entries by id. Ids that do not exist are a no-op.
    async fn delete(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Return the `k` segments most similar to `question`, best first.
    async fn query(&self, question: &str, k: usize) -> Result<Vec<Segment>, StoreError>;
}
