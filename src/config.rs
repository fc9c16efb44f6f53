use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    /// Folder whose files the store mirrors.
    pub root: PathBuf,
    /// Accepted document extension, matched case-insensitively.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "pdf".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Chunking strategy: `by-pages` or `by-sections`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Size budget per section for the `by-sections` strategy.
    #[serde(default = "default_max_section_chars")]
    pub max_section_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            max_section_chars: default_max_section_chars(),
        }
    }
}

fn default_strategy() -> String {
    "by-pages".to_string()
}
fn default_max_section_chars() -> usize {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the Chroma server.
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_tenant")]
    pub tenant: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Page size used when listing stored entries.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection: default_collection(),
            tenant: default_tenant(),
            database: default_database(),
            page_size: default_page_size(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_collection() -> String {
    "pdf_library".to_string()
}
fn default_tenant() -> String {
    "default_tenant".to_string()
}
fn default_database() -> String {
    "default_database".to_string()
}
fn default_page_size() -> usize {
    500
}
fn default_store_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_ollama_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            timeout_secs: default_ollama_timeout_secs(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_chat_model() -> String {
    "llama3".to_string()
}
fn default_ollama_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of segments retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate library
    if config.library.extension.trim_start_matches('.').is_empty() {
        anyhow::bail!("library.extension must not be empty");
    }

    // Validate chunking. Strategy names are checked here so a bad name fails
    // at load time, not on the first file.
    match config.chunking.strategy.as_str() {
        "by-pages" | "by-sections" => {}
        other => anyhow::bail!(
            "Unknown chunking strategy: '{}'. Must be by-pages or by-sections.",
            other
        ),
    }
    if config.chunking.max_section_chars == 0 {
        anyhow::bail!("chunking.max_section_chars must be > 0");
    }

    // Validate store
    if config.store.collection.is_empty() {
        anyhow::bail!("store.collection must not be empty");
    }
    if config.store.page_size < 1 {
        anyhow::bail!("store.page_size must be >= 1");
    }

    // Validate ollama
    if config.ollama.embedding_model.is_empty() {
        anyhow::bail!("ollama.embedding_model must not be empty");
    }
    if config.ollama.chat_model.is_empty() {
        anyhow::bail!("ollama.chat_model must not be empty");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_str(content: &str) -> Result<Config> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        load_config(file.path())
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = load_str("[library]\nroot = \"./data/pdfs\"\n").unwrap();
        assert_eq!(config.library.extension, "pdf");
        assert_eq!(config.chunking.strategy, "by-pages");
        assert_eq!(config.chunking.max_section_chars, 2000);
        assert_eq!(config.store.url, "http://localhost:8000");
        assert_eq!(config.store.collection, "pdf_library");
        assert_eq!(config.store.tenant, "default_tenant");
        assert_eq!(config.store.database, "default_database");
        assert_eq!(config.store.page_size, 500);
        assert_eq!(config.ollama.embedding_model, "nomic-embed-text");
        assert_eq!(config.ollama.chat_model, "llama3");
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn full_config_parses() {
        let config = load_str(
            r#"
            [library]
            root = "/srv/papers"
            extension = "PDF"

            [chunking]
            strategy = "by-sections"
            max_section_chars = 1200

            [store]
            url = "http://chroma:8000"
            collection = "papers"
            tenant = "lab"
            database = "research"
            page_size = 100
            timeout_secs = 10

            [ollama]
            url = "http://ollama:11434"
            embedding_model = "mxbai-embed-large"
            chat_model = "mistral"
            timeout_secs = 60

            [retrieval]
            top_k = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.library.root, PathBuf::from("/srv/papers"));
        assert_eq!(config.chunking.strategy, "by-sections");
        assert_eq!(config.chunking.max_section_chars, 1200);
        assert_eq!(config.store.collection, "papers");
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn missing_library_root_is_rejected() {
        assert!(load_str("[chunking]\nstrategy = \"by-pages\"\n").is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err = load_str("[library]\nroot = \".\"\n[chunking]\nstrategy = \"by-words\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("by-words"));
    }

    #[test]
    fn zero_section_budget_is_rejected() {
        let err = load_str("[library]\nroot = \".\"\n[chunking]\nmax_section_chars = 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("max_section_chars"));
    }

    #[test]
    fn empty_extension_is_rejected() {
        let err = load_str("[library]\nroot = \".\"\nextension = \".\"\n").unwrap_err();
        assert!(err.to_string().contains("library.extension"));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = load_str("[library]\nroot = \".\"\n[store]\ncollection = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("store.collection"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = load_str("[library]\nroot = \".\"\n[store]\npage_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("store.page_size"));
    }

    #[test]
    fn empty_models_are_rejected() {
        let err = load_str("[library]\nroot = \".\"\n[ollama]\nembedding_model = \"\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("embedding_model"));
        let err =
            load_str("[library]\nroot = \".\"\n[ollama]\nchat_model = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("chat_model"));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = load_str("[library]\nroot = \".\"\n[retrieval]\ntop_k = 0\n").unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/paperdex.toml")).is_err());
    }
}
