//! Integration tests for the `memorize` pipeline: ingest end to end, and
//! scope isolation between callers.

mod init_logging;
mod support;

use std::collections::BTreeMap;

const EXTRACTION_JSON: &str = r#"[{"summary": "likes hiking on weekends", "category_hints": ["activities"]}]"#;

#[tokio::test]
async fn memorize_ingest_creates_items_and_categories() {
    let svc = support::service(EXTRACTION_JSON);

    let response = svc
        .memorize("https://example.com/note", "document", None, support::scope("u1"))
        .await
        .unwrap();

    assert!(!response.items.is_empty(), "extraction ran for every configured memory type");
    assert!(response.categories.iter().any(|c| c.name == "activities"));
    for item in &response.items {
        assert_eq!(item.resource_id.as_deref(), Some(response.resource.id.as_str()));
        assert_eq!(item.summary, "likes hiking on weekends");
    }
}

#[tokio::test]
async fn same_content_under_different_scopes_does_not_leak() {
    let svc = support::service(EXTRACTION_JSON);

    svc.memorize("https://example.com/note-a", "document", None, support::scope("alice")).await.unwrap();
    svc.memorize("https://example.com/note-b", "document", None, support::scope("bob")).await.unwrap();

    let alice_items = svc.list_memory_items(support::where_user("alice"), support::no_where_in(), support::scope("alice")).await.unwrap();
    let bob_items = svc.list_memory_items(support::where_user("bob"), support::no_where_in(), support::scope("bob")).await.unwrap();

    assert!(!alice_items.is_empty());
    assert!(!bob_items.is_empty());
    assert!(alice_items.iter().all(|i| i.scope.get("user_id").and_then(|v| v.as_str()) == Some("alice")));
    assert!(bob_items.iter().all(|i| i.scope.get("user_id").and_then(|v| v.as_str()) == Some("bob")));

    let alice_categories = svc.list_memory_categories(support::where_user("alice"), support::no_where_in(), support::scope("alice")).await.unwrap();
    assert!(alice_categories.iter().all(|c| c.scope.get("user_id").and_then(|v| v.as_str()) == Some("alice")));
}

#[tokio::test]
async fn where_in_matches_any_listed_scope_value() {
    let svc = support::service(EXTRACTION_JSON);

    svc.memorize("https://example.com/note-a", "document", None, support::scope("alice")).await.unwrap();
    svc.memorize("https://example.com/note-b", "document", None, support::scope("bob")).await.unwrap();
    svc.memorize("https://example.com/note-c", "document", None, support::scope("carol")).await.unwrap();

    let matched = svc
        .list_memory_items(BTreeMap::new(), support::where_user_in(&["alice", "bob"]), support::scope("alice"))
        .await
        .unwrap();
    assert!(!matched.is_empty());
    assert!(matched
        .iter()
        .all(|i| matches!(i.scope.get("user_id").and_then(|v| v.as_str()), Some("alice") | Some("bob"))));
    assert!(matched.iter().all(|i| i.scope.get("user_id").and_then(|v| v.as_str()) != Some("carol")));
}
