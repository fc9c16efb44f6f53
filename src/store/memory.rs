//! In-memory [`VectorStore`] implementation for tests.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. `query` ranks by
//! naive term overlap instead of embeddings, which is enough to exercise the
//! sync and ask pipelines without a running Chroma or Ollama.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::{Segment, StoreEntry};

use super::{EntryFilter, StoreError, VectorStore};

struct StoredSegment {
    id: String,
    segment: Segment,
}

/// Test-support store. Never persists anything.
pub struct InMemoryStore {
    entries: RwLock<Vec<StoredSegment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn add(&self, ids: &[String], segments: &[Segment]) -> Result<(), StoreError> {
        debug_assert_eq!(ids.len(), segments.len());
        let mut entries = self.entries.write().unwrap();
        for (id, segment) in ids.iter().zip(segments) {
            entries.push(StoredSegment {
                id: id.clone(),
                segment: segment.clone(),
            });
        }
        Ok(())
    }

    async fn get(&self, filter: Option<&EntryFilter>) -> Result<Vec<StoreEntry>, StoreError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|stored| match filter {
                Some(f) => stored.segment.metadata.get(&f.key) == Some(&f.value),
                None => true,
            })
            .map(|stored| StoreEntry {
                id: stored.id.clone(),
                metadata: stored.segment.metadata.clone(),
            })
            .collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap();
        entries.retain(|stored| !ids.contains(&stored.id));
        Ok(())
    }

    async fn query(&self, question: &str, k: usize) -> Result<Vec<Segment>, StoreError> {
        let question_lower = question.to_lowercase();
        let terms: Vec<&str> = question_lower.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let entries = self.entries.read().unwrap();
        let mut scored: Vec<(usize, Segment)> = entries
            .iter()
            .filter_map(|stored| {
                let text_lower = stored.segment.text.to_lowercase();
                let matches = terms.iter().filter(|t| text_lower.contains(*t)).count();
                if matches > 0 {
                    Some((matches, stored.segment.clone()))
                } else {
                    None
                }
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(k);
        Ok(scored.into_iter().map(|(_, segment)| segment).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segment(text: &str, hash: &str) -> Segment {
        let mut s = Segment::new(text);
        s.metadata
            .insert(crate::models::SOURCE_HASH_KEY.to_string(), json!(hash));
        s
    }

    #[tokio::test]
    async fn add_then_get_returns_all_entries() {
        let store = InMemoryStore::new();
        store
            .add(
                &["a".to_string(), "b".to_string()],
                &[segment("alpha", "h1"), segment("beta", "h2")],
            )
            .await
            .unwrap();

        let entries = store.get(None).await.unwrap();
        assert_eq!(entries.len(), 2);
        let hashes: Vec<_> = entries
            .iter()
            .filter_map(|e| e.source_hash().map(str::to_string))
            .collect();
        assert!(hashes.contains(&"h1".to_string()));
        assert!(hashes.contains(&"h2".to_string()));
    }

    #[tokio::test]
    async fn get_with_filter_narrows_by_metadata() {
        let store = InMemoryStore::new();
        store
            .add(
                &["a".to_string(), "b".to_string(), "c".to_string()],
                &[
                    segment("one", "h1"),
                    segment("two", "h2"),
                    segment("three", "h1"),
                ],
            )
            .await
            .unwrap();

        let filter = EntryFilter::new(crate::models::SOURCE_HASH_KEY, json!("h1"));
        let entries = store.get(Some(&filter)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.source_hash() == Some("h1")));
    }

    #[tokio::test]
    async fn delete_removes_only_named_ids() {
        let store = InMemoryStore::new();
        store
            .add(
                &["a".to_string(), "b".to_string()],
                &[segment("one", "h1"), segment("two", "h2")],
            )
            .await
            .unwrap();

        store.delete(&["a".to_string()]).await.unwrap();
        let entries = store.get(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
    }

    #[tokio::test]
    async fn deleting_missing_ids_is_a_noop() {
        let store = InMemoryStore::new();
        store
            .add(&["a".to_string()], &[segment("one", "h1")])
            .await
            .unwrap();

        store
            .delete(&["ghost".to_string(), "phantom".to_string()])
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn query_ranks_by_term_overlap_and_truncates() {
        let store = InMemoryStore::new();
        store
            .add(
                &["a".to_string(), "b".to_string(), "c".to_string()],
                &[
                    segment("rust ownership and borrowing", "h1"),
                    segment("rust ownership", "h2"),
                    segment("gardening tips", "h3"),
                ],
            )
            .await
            .unwrap();

        let hits = store.query("rust ownership borrowing", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "rust ownership and borrowing");
        assert_eq!(hits[1].text, "rust ownership");
    }

    #[tokio::test]
    async fn query_on_empty_store_returns_nothing() {
        let store = InMemoryStore::new();
        assert!(store.query("anything", 5).await.unwrap().is_empty());
        assert!(store.query("", 5).await.unwrap().is_empty());
    }
}
