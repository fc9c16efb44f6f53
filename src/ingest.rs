//! Ingestion pipeline.
//!
//! Turns folder files into stored segments: hash → chunk → stamp the source
//! hash → assign fresh ids → one `add` call per file. Files fail
//! independently; a bad PDF is recorded in the [`IngestReport`] and the
//! batch keeps going. The single `add` per file is what makes a file either
//! fully stored or not stored at all.

use anyhow::{bail, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::chunker::Chunker;
use crate::hash::hash_file;
use crate::models::{IngestFailure, IngestReport, IngestedFile, Segment, SOURCE_HASH_KEY};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::VectorStore;

/// Stamp the originating file hash into a segment's metadata.
///
/// Pure metadata union: everything the chunker wrote survives, except that
/// the injected hash wins over any pre-existing key of the same name.
pub fn stamp_source_hash(mut segment: Segment, hash: &str) -> Segment {
    segment
        .metadata
        .insert(SOURCE_HASH_KEY.to_string(), Value::String(hash.to_string()));
    segment
}

/// Ingest each path independently, collecting per-file failures.
///
/// Segment ids are random v4 UUIDs minted here, so re-ingesting identical
/// bytes yields fresh entries rather than overwrites.
pub async fn ingest_files(
    store: &dyn VectorStore,
    chunker: &dyn Chunker,
    paths: &[PathBuf],
    reporter: &dyn ProgressReporter,
) -> IngestReport {
    let mut report = IngestReport::default();
    let total = paths.len() as u64;

    for (i, path) in paths.iter().enumerate() {
        match ingest_one(store, chunker, path).await {
            Ok(ingested) => report.ingested.push(ingested),
            Err(e) => {
                eprintln!("warning: skipping {}: {:#}", path.display(), e);
                report.failures.push(IngestFailure {
                    path: path.clone(),
                    reason: format!("{:#}", e),
                });
            }
        }
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        reporter.report(ProgressEvent::Ingesting {
            file,
            n: (i + 1) as u64,
            total,
        });
    }

    report
}

async fn ingest_one(
    store: &dyn VectorStore,
    chunker: &dyn Chunker,
    path: &Path,
) -> Result<IngestedFile> {
    let hash = hash_file(path)?;
    let segments = chunker.chunk(path)?;
    if segments.is_empty() {
        bail!("no extractable text");
    }

    let segments: Vec<Segment> = segments
        .into_iter()
        .map(|segment| stamp_source_hash(segment, &hash))
        .collect();
    let ids: Vec<String> = segments
        .iter()
        .map(|_| Uuid::new_v4().to_string())
        .collect();

    store.add(&ids, &segments).await?;

    Ok(IngestedFile {
        path: path.to_path_buf(),
        hash,
        segments: segments.len(),
    })
}

/// Remove entries by id. Ids that are already gone are a no-op by store
/// contract; there is no existence check here.
pub async fn remove_entries(store: &dyn VectorStore, ids: &[String]) -> Result<()> {
    store.delete(ids).await?;
    Ok(())
}
