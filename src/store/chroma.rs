//! Chroma-backed [`VectorStore`].
//!
//! Talks to a Chroma server over its v2 HTTP API:
//!
//! ```text
//! GET  /api/v2/tenants/{t}/databases/{d}/collections/{name}   resolve by name
//! POST /api/v2/tenants/{t}/databases/{d}/collections          create
//! POST .../collections/{id}/add                               store segments
//! POST .../collections/{id}/get                               list entries (paged)
//! POST .../collections/{id}/delete                            remove by id
//! POST .../collections/{id}/query                             similarity search
//! ```
//!
//! The adapter owns embedding: segment texts are run through the configured
//! [`Embedder`] before `add` and `query`, so vectors never leave this module.
//! Collection resolution is an explicit get-or-create; callers learn through
//! [`CollectionStatus`] whether the collection was found or freshly made.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::embedding::Embedder;
use crate::models::{Segment, StoreEntry};

use super::{EntryFilter, StoreError, VectorStore};

/// Whether the configured collection existed before this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Existing,
    Created,
}

pub struct ChromaStore {
    client: reqwest::Client,
    /// `{base}/collections/{collection_id}`, ready for operation suffixes.
    collection_url: String,
    page_size: usize,
    embedder: Box<dyn Embedder>,
}

impl ChromaStore {
    /// Connect to the server and resolve the configured collection,
    /// creating it when absent.
    pub async fn connect(
        config: &StoreConfig,
        embedder: Box<dyn Embedder>,
    ) -> Result<(Self, CollectionStatus), StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let collections_url = format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            config.url.trim_end_matches('/'),
            config.tenant,
            config.database
        );

        let (id, status) =
            resolve_collection(&client, &collections_url, &config.collection).await?;

        Ok((
            Self {
                client,
                collection_url: format!("{}/{}", collections_url, id),
                page_size: config.page_size,
                embedder,
            },
            status,
        ))
    }

    async fn post(&self, operation: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .post(format!("{}/{}", self.collection_url, operation))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn add(&self, ids: &[String], segments: &[Segment]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| StoreError::Embedding(format!("{:#}", e)))?;
        let metadatas: Vec<&Map<String, Value>> =
            segments.iter().map(|s| &s.metadata).collect();

        let body = json!({
            "ids": ids,
            "embeddings": embeddings,
            "documents": texts,
            "metadatas": metadatas,
        });
        self.post("add", &body).await?;
        Ok(())
    }

    async fn get(&self, filter: Option<&EntryFilter>) -> Result<Vec<StoreEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut body = json!({
                "limit": self.page_size,
                "offset": offset,
                "include": ["metadatas"],
            });
            if let Some(f) = filter {
                let mut clause = Map::new();
                clause.insert(f.key.clone(), f.value.clone());
                body["where"] = Value::Object(clause);
            }

            let page = self.post("get", &body).await?;
            let page_entries = parse_get_page(&page)?;
            let page_len = page_entries.len();
            entries.extend(page_entries);

            if page_len < self.page_size {
                break;
            }
            offset += page_len;
        }

        Ok(entries)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        self.post("delete", &json!({ "ids": ids })).await?;
        Ok(())
    }

    async fn query(&self, question: &str, k: usize) -> Result<Vec<Segment>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embeddings = self
            .embedder
            .embed(&[question.to_string()])
            .await
            .map_err(|e| StoreError::Embedding(format!("{:#}", e)))?;

        let body = json!({
            "query_embeddings": embeddings,
            "n_results": k,
            "include": ["documents", "metadatas"],
        });
        let response = self.post("query", &body).await?;
        parse_query_response(&response)
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Unreachable(e.to_string())
}

/// Turn a response into JSON, mapping non-2xx statuses to [`StoreError::Api`].
async fn read_json(response: reqwest::Response) -> Result<Value, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json()
        .await
        .map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

/// GET the collection by name; on 404, create it.
async fn resolve_collection(
    client: &reqwest::Client,
    collections_url: &str,
    name: &str,
) -> Result<(String, CollectionStatus), StoreError> {
    let response = client
        .get(format!("{}/{}", collections_url, name))
        .send()
        .await
        .map_err(transport)?;

    if response.status().as_u16() == 404 {
        let created = client
            .post(collections_url)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(transport)?;
        let json = read_json(created).await?;
        return Ok((collection_id(&json)?, CollectionStatus::Created));
    }

    let json = read_json(response).await?;
    Ok((collection_id(&json)?, CollectionStatus::Existing))
}

fn collection_id(json: &Value) -> Result<String, StoreError> {
    json.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidResponse("collection has no id".to_string()))
}

/// One page of a `get` response: parallel `ids` and `metadatas` arrays.
/// A null metadata slot becomes an empty map, which the sync diff treats
/// as a stale entry.
fn parse_get_page(json: &Value) -> Result<Vec<StoreEntry>, StoreError> {
    let ids = json
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::InvalidResponse("get response missing ids".to_string()))?;
    let metadatas = json.get("metadatas").and_then(Value::as_array);

    let mut entries = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let id = id
            .as_str()
            .ok_or_else(|| StoreError::InvalidResponse("non-string entry id".to_string()))?
            .to_string();
        let metadata = metadatas
            .and_then(|m| m.get(i))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        entries.push(StoreEntry { id, metadata });
    }
    Ok(entries)
}

/// A `query` response nests one row set per query embedding; we always send
/// exactly one question, so only the first row set matters.
fn parse_query_response(json: &Value) -> Result<Vec<Segment>, StoreError> {
    let documents = json
        .get("documents")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(Value::as_array)
        .ok_or_else(|| {
            StoreError::InvalidResponse("query response missing documents".to_string())
        })?;
    let metadatas = json
        .get("metadatas")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .and_then(Value::as_array);

    let mut segments = Vec::with_capacity(documents.len());
    for (i, doc) in documents.iter().enumerate() {
        let metadata = metadatas
            .and_then(|m| m.get(i))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        segments.push(Segment {
            text: doc.as_str().unwrap_or_default().to_string(),
            metadata,
        });
    }
    Ok(segments)
}
