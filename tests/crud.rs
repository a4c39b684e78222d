//! Integration tests for the direct CRUD pipelines: create, update, delete,
//! and the category resummarization each mutation triggers.

mod init_logging;
mod support;

#[tokio::test]
async fn create_update_delete_cycle_resummarizes_categories() {
    let svc = support::service("a concise summary");
    let scope = support::scope("u1");

    let created = svc
        .create_memory_item("profile", "enjoys chess", vec!["hobbies".to_string()], scope.clone())
        .await
        .unwrap();
    assert_eq!(created.memory_item.summary, "enjoys chess");
    assert!(created.memory_item.resource_id.is_none());
    assert_eq!(created.category_updates.len(), 1);
    assert_eq!(created.category_updates[0].name, "hobbies");

    let updated = svc
        .update_memory_item(
            created.memory_item.id.clone(),
            None,
            Some("enjoys chess and go".to_string()),
            Some(vec!["hobbies".to_string(), "games".to_string()]),
            scope.clone(),
        )
        .await
        .unwrap();
    assert_eq!(updated.memory_item.summary, "enjoys chess and go");
    let updated_names: Vec<_> = updated.category_updates.iter().map(|c| c.name.clone()).collect();
    assert!(updated_names.contains(&"hobbies".to_string()));
    assert!(updated_names.contains(&"games".to_string()));

    let remaining_before_delete = svc.list_memory_items(support::where_user("u1"), support::no_where_in(), scope.clone()).await.unwrap();
    assert_eq!(remaining_before_delete.len(), 1);

    svc.delete_memory_item(created.memory_item.id.clone(), scope.clone()).await.unwrap();

    let remaining = svc.list_memory_items(support::where_user("u1"), support::no_where_in(), scope.clone()).await.unwrap();
    assert!(remaining.iter().all(|i| i.id != created.memory_item.id));
}

#[tokio::test]
async fn create_rejects_unknown_memory_type() {
    let svc = support::service("a concise summary");
    let err = svc
        .create_memory_item("not_a_real_type", "content", Vec::new(), support::scope("u1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, memoria_core::ErrorKind::InvalidInput);
}

#[tokio::test]
async fn update_requires_at_least_one_changed_field() {
    let svc = support::service("a concise summary");
    let created = svc
        .create_memory_item("profile", "enjoys chess", Vec::new(), support::scope("u1"))
        .await
        .unwrap();

    let err = svc
        .update_memory_item(created.memory_item.id, None, None, None, support::scope("u1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, memoria_core::ErrorKind::InvalidInput);
}
