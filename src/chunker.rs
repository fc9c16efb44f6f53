//! PDF chunking strategies.
//!
//! A [`Chunker`] turns one PDF file into the [`Segment`]s that get embedded
//! and stored. The set of strategies is closed and validated when the
//! configuration is loaded, so an unknown name fails before any file is
//! touched:
//!
//! - **`by-pages`** — one segment per PDF page, metadata `{"page": n}`.
//! - **`by-sections`** — the full text split on blank-line boundaries into
//!   sections capped at `chunking.max_section_chars`, metadata
//!   `{"section": n}`.
//!
//! Both strategies drop segments with no extractable text; a file that
//! yields nothing at all is reported as a failure by the ingest pipeline.

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::Path;

use crate::config::ChunkingConfig;
use crate::models::Segment;

/// Turns one source file into storable segments.
pub trait Chunker: Send + Sync + std::fmt::Debug {
    /// Strategy name as it appears in the configuration.
    fn name(&self) -> &'static str;

    /// Extract and split `path`. Segment order follows document order.
    fn chunk(&self, path: &Path) -> Result<Vec<Segment>>;
}

/// Select the configured strategy. Unknown names are a configuration error
/// here, never at chunk time.
pub fn chunker_for(config: &ChunkingConfig) -> Result<Box<dyn Chunker>> {
    match config.strategy.as_str() {
        "by-pages" => Ok(Box::new(ByPages)),
        "by-sections" => Ok(Box::new(BySections {
            max_chars: config.max_section_chars,
        })),
        other => bail!(
            "Unknown chunking strategy: '{}'. Must be by-pages or by-sections.",
            other
        ),
    }
}

/// One segment per PDF page.
#[derive(Debug)]
pub struct ByPages;

impl Chunker for ByPages {
    fn name(&self) -> &'static str {
        "by-pages"
    }

    fn chunk(&self, path: &Path) -> Result<Vec<Segment>> {
        let pages = pdf_extract::extract_text_by_pages(path)
            .with_context(|| format!("Failed to extract pages from {}", path.display()))?;
        Ok(page_segments(&pages))
    }
}

/// Page numbers stay aligned with the document even when blank pages are
/// skipped: metadata carries the 1-based position in the PDF.
fn page_segments(pages: &[String]) -> Vec<Segment> {
    pages
        .iter()
        .enumerate()
        .filter_map(|(idx, text)| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            let mut segment = Segment::new(trimmed);
            segment.metadata.insert("page".to_string(), json!(idx + 1));
            Some(segment)
        })
        .collect()
}

/// Blank-line sections capped at a byte budget.
#[derive(Debug)]
pub struct BySections {
    max_chars: usize,
}

impl Chunker for BySections {
    fn name(&self) -> &'static str {
        "by-sections"
    }

    fn chunk(&self, path: &Path) -> Result<Vec<Segment>> {
        let text = pdf_extract::extract_text(path)
            .with_context(|| format!("Failed to extract text from {}", path.display()))?;
        Ok(section_segments(&text, self.max_chars))
    }
}

fn section_segments(text: &str, max_chars: usize) -> Vec<Segment> {
    split_sections(text, max_chars)
        .into_iter()
        .enumerate()
        .map(|(idx, section)| {
            let mut segment = Segment::new(section);
            segment
                .metadata
                .insert("section".to_string(), json!(idx + 1));
            segment
        })
        .collect()
}

/// Split text into sections on paragraph boundaries (`\n\n`), respecting
/// `max_chars`. Adjacent small paragraphs coalesce; a single paragraph over
/// the budget is hard-split at the nearest newline or space.
fn split_sections(text: &str, max_chars: usize) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed the budget, flush first
        let would_be = if current.is_empty() {
            trimmed.len()
        } else {
            current.len() + 2 + trimmed.len() // +2 for the \n\n separator
        };
        if would_be > max_chars && !current.is_empty() {
            sections.push(std::mem::take(&mut current));
        }

        if trimmed.len() > max_chars {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            // Hard split at max_chars, preferring a newline or space boundary
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let limit = floor_char_boundary(remaining, remaining.len().min(max_chars));
                let mut cut = if limit < remaining.len() {
                    remaining[..limit]
                        .rfind('\n')
                        .or_else(|| remaining[..limit].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(limit)
                } else {
                    limit
                };
                if cut == 0 {
                    // Budget smaller than one character; take one anyway
                    cut = remaining
                        .char_indices()
                        .nth(1)
                        .map(|(i, _)| i)
                        .unwrap_or(remaining.len());
                }
                let piece = remaining[..cut].trim();
                if !piece.is_empty() {
                    sections.push(piece.to_string());
                }
                remaining = &remaining[cut..];
            }
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(trimmed);
        }
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
