//! Integration tests for the `retrieve` pipelines: RAG scoring, the
//! sufficiency short-circuit, and the LLM-ranking fallback to RAG.

mod init_logging;
mod support;

use memoria_core::config::{RetrieveMethod, SectionConfig};
use memoria_core::pipelines::retrieve::types::Query;
use memoria_core::MemoryService;

const EXTRACTION_JSON: &str = r#"[{"summary": "likes hiking on weekends", "category_hints": ["activities"]}]"#;

#[tokio::test]
async fn rag_retrieval_returns_scored_context() {
    let svc = support::service(EXTRACTION_JSON);
    svc.memorize("https://example.com/note", "document", None, support::scope("u1")).await.unwrap();

    let queries = vec![Query::user("what does the user enjoy doing outdoors")];
    let response = svc.retrieve(queries, support::where_user("u1"), support::no_where_in(), support::scope("u1")).await.unwrap();

    assert!(response.needs_retrieval);
    assert!(!response.rewritten_query.is_empty());
    assert!(!response.items.is_empty());
    assert!(response.items.iter().all(|scored| scored.score.is_some()));
    assert!(!response.categories.is_empty());
    assert!(response.categories.iter().all(|scored| scored.score.is_some()));
}

#[tokio::test]
async fn sufficiency_check_short_circuits_before_item_recall() {
    let mut config = support::mock_config(EXTRACTION_JSON);
    config.llm_profiles.push(support::mock_profile("sufficiency", "yes"));
    config.retrieve_config.sufficiency_check = true;
    config.retrieve_config.sufficiency_check_llm_profile = "sufficiency".to_string();
    config.retrieve_config.category = SectionConfig::enabled(1);
    let svc = MemoryService::new(config).unwrap();

    svc.memorize("https://example.com/note", "document", None, support::scope("u1")).await.unwrap();

    let queries = vec![Query::user("tell me about the user")];
    let response = svc.retrieve(queries, support::where_user("u1"), support::no_where_in(), support::scope("u1")).await.unwrap();

    assert_eq!(response.categories.len(), 1);
    assert!(response.items.is_empty());
    assert!(response.resources.is_empty());
}

#[tokio::test]
async fn llm_ranking_falls_back_to_rag_on_unparseable_output() {
    let mut config = support::mock_config(EXTRACTION_JSON);
    config.llm_profiles.push(support::mock_profile("ranking", "this is not a json array"));
    config.retrieve_config.method = RetrieveMethod::Llm;
    config.retrieve_config.llm_ranking_llm_profile = "ranking".to_string();
    let svc = MemoryService::new(config).unwrap();

    svc.memorize("https://example.com/note", "document", None, support::scope("u1")).await.unwrap();

    let queries = vec![Query::user("what does the user like")];
    let response = svc.retrieve(queries, support::where_user("u1"), support::no_where_in(), support::scope("u1")).await.unwrap();

    assert!(!response.items.is_empty(), "unparseable ranking output should fall back to RAG scoring");
    assert!(response.items.iter().all(|scored| scored.score.is_some()));
}
