//! The `ask` pipeline: retrieve the best-matching segments for a question,
//! fold them into the QA prompt, and let the chat model answer from that
//! context alone.

use anyhow::Result;

use crate::config::Config;
use crate::llm::{qa_prompt, OllamaChat};
use crate::store::VectorStore;

/// Retrieve the `top_k` best-matching segments and build the QA prompt.
///
/// An empty result set is not an error: the prompt goes out with an empty
/// context slot and the model is instructed to say it does not know.
pub async fn build_question_prompt(
    store: &dyn VectorStore,
    question: &str,
    top_k: usize,
) -> Result<String> {
    let segments = store.query(question, top_k).await?;
    if segments.is_empty() {
        eprintln!("warning: no stored segments matched the question");
    }
    let contexts: Vec<String> = segments.into_iter().map(|s| s.text).collect();
    Ok(qa_prompt(question, &contexts))
}

pub async fn run_ask(
    config: &Config,
    store: &dyn VectorStore,
    question: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let k = top_k.unwrap_or(config.retrieval.top_k);
    let prompt = build_question_prompt(store, question, k).await?;

    let chat = OllamaChat::new(&config.ollama)?;
    let answer = chat.generate(&prompt).await?;
    println!("{}", answer.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;
    use crate::store::memory::InMemoryStore;

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let segments = vec![
            Segment::new("The borrow checker enforces aliasing rules."),
            Segment::new("Lifetimes name how long references stay valid."),
            Segment::new("Cargo builds and tests Rust projects."),
        ];
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        store.add(&ids, &segments).await.unwrap();
        store
    }

    #[tokio::test]
    async fn prompt_carries_the_best_matching_segment() {
        let store = seeded_store().await;
        let prompt = build_question_prompt(&store, "what does the borrow checker do", 1)
            .await
            .unwrap();
        assert!(prompt.contains("The borrow checker enforces aliasing rules."));
        assert!(!prompt.contains("Cargo builds"));
    }

    #[tokio::test]
    async fn top_k_bounds_the_context() {
        let store = seeded_store().await;
        let prompt = build_question_prompt(&store, "rust references lifetimes borrow", 2)
            .await
            .unwrap();
        let hits = ["borrow checker", "Lifetimes name", "Cargo builds"]
            .iter()
            .filter(|needle| prompt.contains(**needle))
            .count();
        assert_eq!(hits, 2);
    }

    #[tokio::test]
    async fn empty_store_still_builds_a_prompt() {
        let store = InMemoryStore::new();
        let prompt = build_question_prompt(&store, "anything at all", 5)
            .await
            .unwrap();
        assert!(prompt.contains("Question: anything at all"));
        assert!(prompt.ends_with("Answer:"));
    }
}
