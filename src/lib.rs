//! # Paperdex
//!
//! A local-first question-answering tool for a folder of PDFs.
//!
//! Paperdex mirrors a PDF library into a Chroma vector store and answers
//! questions against it. Files are identified by content hash, so `sync`
//! only ever touches documents that actually changed: new files are chunked,
//! embedded, and added; entries whose source file disappeared are removed.
//! `ask` retrieves the best-matching segments and hands them to a local
//! Ollama chat model as grounding context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────┐
//! │  Library │──▶│    Sync     │──▶│  Chroma  │
//! │  *.pdf   │   │ Hash+Chunk  │   │ +Embed   │
//! └──────────┘   └─────────────┘   └────┬─────┘
//!                                       │
//!                                       ▼
//!                                 ┌──────────┐
//!                                 │   Ask    │
//!                                 │ (Ollama) │
//!                                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pdx info                      # show the resolved configuration
//! pdx sync --dry-run            # print the plan without applying it
//! pdx sync                      # mirror the folder into the store
//! pdx ask "what does chapter 3 cover?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`hash`] | Content hashing for file identity |
//! | [`chunker`] | PDF text extraction and chunking |
//! | [`embedding`] | Ollama embedding client |
//! | [`store`] | Vector store trait and backends |
//! | [`sync`] | Folder/store reconciliation |
//! | [`ingest`] | Per-file ingestion |
//! | [`llm`] | Ollama chat client and the QA prompt |
//! | [`ask`] | Question-answering pipeline |
//! | [`progress`] | Progress reporting |

pub mod ask;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod hash;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod progress;
pub mod store;
pub mod sync;
