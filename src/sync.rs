//! Folder/store synchronization.
//!
//! The sync engine treats the folder as the source of truth and the store as
//! a derived index. A pass never trusts remembered state: it re-hashes the
//! folder, lists what the store holds, and diffs the two hash sets into a
//! [`SyncPlan`]. Running the plan through the ingest pipeline and `delete`
//! converges the store; running sync again immediately yields an empty plan.

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::chunker::chunker_for;
use crate::config::Config;
use crate::hash::hash_file;
use crate::ingest;
use crate::models::SyncPlan;
use crate::progress::{ProgressEvent, ProgressMode, ProgressReporter};
use crate::store::VectorStore;

/// Walk the library folder and collect files with the accepted extension,
/// matched case-insensitively. Paths come back sorted so enumeration order
/// is deterministic across runs.
pub fn scan_folder(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Library folder does not exist: {}", root.display());
    }
    let wanted = extension.trim_start_matches('.');

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(wanted))
            .unwrap_or(false);
        if matches {
            paths.push(entry.path().to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}

/// Hash every file into a content-hash → path map.
///
/// Byte-identical files collapse to one entry; the later path in enumeration
/// order wins and becomes the representative for that content.
pub fn hash_folder(
    paths: &[PathBuf],
    reporter: &dyn ProgressReporter,
) -> Result<BTreeMap<String, PathBuf>> {
    let total = paths.len() as u64;
    let mut map = BTreeMap::new();
    for (i, path) in paths.iter().enumerate() {
        let hash = hash_file(path)?;
        map.insert(hash, path.clone());
        reporter.report(ProgressEvent::Hashing {
            n: (i + 1) as u64,
            total,
        });
    }
    Ok(map)
}

/// Diff the folder against the store.
///
/// A folder hash absent from the store means its file gets added; a stored
/// entry whose hash matches no folder file (or that has no hash at all) gets
/// removed. Both plan sides are sorted, so two diffs over unchanged state
/// compare equal.
pub async fn diff(
    folder: &BTreeMap<String, PathBuf>,
    store: &dyn VectorStore,
) -> Result<SyncPlan> {
    let entries = store.get(None).await?;

    let store_hashes: BTreeSet<&str> = entries.iter().filter_map(|e| e.source_hash()).collect();

    let mut files_to_add: Vec<PathBuf> = folder
        .iter()
        .filter(|(hash, _)| !store_hashes.contains(hash.as_str()))
        .map(|(_, path)| path.clone())
        .collect();
    files_to_add.sort();

    let mut entry_ids_to_remove: Vec<String> = entries
        .iter()
        .filter(|e| match e.source_hash() {
            Some(hash) => !folder.contains_key(hash),
            // Entries without a hash can never match a folder file
            None => true,
        })
        .map(|e| e.id.clone())
        .collect();
    entry_ids_to_remove.sort();

    Ok(SyncPlan {
        files_to_add,
        entry_ids_to_remove,
    })
}

/// Options for [`run_sync`], straight from the CLI flags.
pub struct SyncOptions {
    /// Print the plan and stop.
    pub dry_run: bool,
    /// Assume "yes" for both confirmations.
    pub yes: bool,
    pub progress: ProgressMode,
}

/// Plan, confirm, execute, report.
///
/// Additions and removals are confirmed independently: declining one does
/// not cancel the other. Ingest failures do not stop the pass; they are
/// reported at the end and turn the exit status into an error after
/// everything else has run.
pub async fn run_sync(
    config: &Config,
    store: &dyn VectorStore,
    options: &SyncOptions,
) -> Result<()> {
    let chunker = chunker_for(&config.chunking)?;
    let reporter = options.progress.reporter();

    let files = scan_folder(&config.library.root, &config.library.extension)?;
    let folder = hash_folder(&files, reporter.as_ref())?;
    let plan = diff(&folder, store).await?;

    println!("sync {}", config.library.root.display());
    println!("  files in folder: {}", files.len());
    println!("  unique documents: {}", folder.len());
    println!("  to add: {}", plan.files_to_add.len());
    println!("  to remove: {}", plan.entry_ids_to_remove.len());

    if plan.is_empty() {
        println!("ok (store is in sync)");
        return Ok(());
    }

    for path in &plan.files_to_add {
        println!("  + {}", path.display());
    }
    for id in &plan.entry_ids_to_remove {
        println!("  - {}", id);
    }

    if options.dry_run {
        println!("dry-run, no changes applied");
        return Ok(());
    }

    let mut failures = 0usize;

    if !plan.files_to_add.is_empty() {
        let proceed = options.yes
            || Confirm::new()
                .with_prompt(format!("Add {} file(s) to the store?", plan.files_to_add.len()))
                .default(false)
                .interact()
                .context("Failed to read user input")?;
        if proceed {
            let report =
                ingest::ingest_files(store, chunker.as_ref(), &plan.files_to_add, reporter.as_ref())
                    .await;
            println!("  files ingested: {}", report.ingested.len());
            println!("  segments added: {}", report.total_segments());
            for failure in &report.failures {
                println!("  failed: {} ({})", failure.path.display(), failure.reason);
            }
            failures = report.failures.len();
        } else {
            println!("  additions skipped ({} files)", plan.files_to_add.len());
        }
    }

    if !plan.entry_ids_to_remove.is_empty() {
        let proceed = options.yes
            || Confirm::new()
                .with_prompt(format!(
                    "Remove {} stale entries from the store?",
                    plan.entry_ids_to_remove.len()
                ))
                .default(false)
                .interact()
                .context("Failed to read user input")?;
        if proceed {
            ingest::remove_entries(store, &plan.entry_ids_to_remove).await?;
            println!("  entries removed: {}", plan.entry_ids_to_remove.len());
        } else {
            println!(
                "  removals skipped ({} entries)",
                plan.entry_ids_to_remove.len()
            );
        }
    }

    if failures > 0 {
        bail!("{} file(s) failed to ingest", failures);
    }
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::stamp_source_hash;
    use crate::models::Segment;
    use crate::progress::NoProgress;
    use crate::store::memory::InMemoryStore;
    use crate::store::VectorStore;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    async fn seed(store: &InMemoryStore, id: &str, hash: &str) {
        let segment = stamp_source_hash(Segment::new(format!("text for {}", id)), hash);
        store.add(&[id.to_string()], &[segment]).await.unwrap();
    }

    #[test]
    fn scan_filters_extension_case_insensitively_and_recurses() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.pdf", b"a");
        write(&dir, "B.PDF", b"b");
        write(&dir, "notes.txt", b"c");
        write(&dir, "nested/deep.pdf", b"d");

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(paths.len(), 3);
        assert!(names.contains(&"a.pdf".to_string()));
        assert!(names.contains(&"B.PDF".to_string()));
        assert!(names.contains(&"nested/deep.pdf".to_string()));
    }

    #[test]
    fn scan_returns_sorted_paths() {
        let dir = TempDir::new().unwrap();
        write(&dir, "z.pdf", b"z");
        write(&dir, "a.pdf", b"a");
        write(&dir, "m.pdf", b"m");

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn scan_missing_root_is_an_error() {
        let err = scan_folder(Path::new("/nonexistent/library"), "pdf").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn duplicate_content_collapses_to_the_later_path() {
        let dir = TempDir::new().unwrap();
        write(&dir, "copy1.pdf", b"identical bytes");
        write(&dir, "copy2.pdf", b"identical bytes");

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let map = hash_folder(&paths, &NoProgress).unwrap();
        assert_eq!(map.len(), 1);
        let (_, path) = map.iter().next().unwrap();
        assert!(path.ends_with("copy2.pdf"));
    }

    #[tokio::test]
    async fn diff_reports_both_set_differences() {
        // Folder holds hashes {H1, H2}; store holds {H2, H3}.
        let dir = TempDir::new().unwrap();
        write(&dir, "a.pdf", b"content one");
        let b = write(&dir, "b.pdf", b"content two");
        let hash_b = hash_file(&b).unwrap();

        let store = InMemoryStore::new();
        seed(&store, "e2", &hash_b).await;
        seed(&store, "e3", "0000dead0000").await;

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let folder = hash_folder(&paths, &NoProgress).unwrap();
        let plan = diff(&folder, &store).await.unwrap();

        assert_eq!(plan.files_to_add.len(), 1);
        assert!(plan.files_to_add[0].ends_with("a.pdf"));
        assert_eq!(plan.entry_ids_to_remove, vec!["e3".to_string()]);
    }

    #[tokio::test]
    async fn empty_folder_schedules_every_entry_for_removal() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryStore::new();
        seed(&store, "e1", "h1").await;
        seed(&store, "e2", "h2").await;
        seed(&store, "e3", "h3").await;

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let folder = hash_folder(&paths, &NoProgress).unwrap();
        let plan = diff(&folder, &store).await.unwrap();

        assert!(plan.files_to_add.is_empty());
        assert_eq!(
            plan.entry_ids_to_remove,
            vec!["e1".to_string(), "e2".to_string(), "e3".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_store_schedules_every_file_for_addition() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.pdf", b"one");
        write(&dir, "b.pdf", b"two");
        let store = InMemoryStore::new();

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let folder = hash_folder(&paths, &NoProgress).unwrap();
        let plan = diff(&folder, &store).await.unwrap();

        assert_eq!(plan.files_to_add.len(), 2);
        assert!(plan.entry_ids_to_remove.is_empty());
    }

    #[tokio::test]
    async fn entries_without_a_hash_are_scheduled_for_removal() {
        let store = InMemoryStore::new();
        store
            .add(&["bare".to_string()], &[Segment::new("no metadata")])
            .await
            .unwrap();

        let plan = diff(&BTreeMap::new(), &store).await.unwrap();
        assert_eq!(plan.entry_ids_to_remove, vec!["bare".to_string()]);
    }

    #[tokio::test]
    async fn diff_is_idempotent_without_intervening_mutation() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.pdf", b"alpha");
        write(&dir, "b.pdf", b"beta");
        let store = InMemoryStore::new();
        seed(&store, "stale", "gone").await;

        let paths = scan_folder(dir.path(), "pdf").unwrap();
        let folder = hash_folder(&paths, &NoProgress).unwrap();
        let first = diff(&folder, &store).await.unwrap();
        let second = diff(&folder, &store).await.unwrap();
        assert_eq!(first, second);
    }
}
