mod common;

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use vitrine_gateway::client::{ApiClient, QueryOptions, ResourceCrud, ResourceMutations};
use vitrine_gateway::handlers::{require_fields, ResourceConfig};

async fn spawn(mock: Arc<common::MockContent>) -> Result<String> {
    common::spawn_app(
        common::state_with(mock),
        vec![ResourceConfig::new("products").validate(require_fields(&["name"]))],
    )
    .await
}

#[tokio::test]
async fn logically_equal_queries_share_one_cache_entry_and_one_fetch() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = ApiClient::new(base);

    // Same logical query, keys supplied in different order
    let a = QueryOptions::new()
        .with_param("category", "balances")
        .with_param("active", "true");
    let b = QueryOptions::new()
        .with_param("active", "true")
        .with_param("category", "balances");

    let first = client.fetch("/resource/products", &a).await?;
    let second = client.fetch("/resource/products", &b).await?;

    assert_eq!(first, mock.collection);
    assert_eq!(second, mock.collection);
    assert_eq!(mock.calls.list_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_identical_reads_are_deduplicated() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = Arc::new(ApiClient::new(base));
    let options = QueryOptions::new().with_param("category", "balances");

    let (a, b, c) = tokio::join!(
        client.fetch("/resource/products", &options),
        client.fetch("/resource/products", &options),
        client.fetch("/resource/products", &options),
    );

    a?;
    b?;
    c?;
    assert_eq!(mock.calls.list_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn refresh_bypasses_cache_but_revalidate_respects_the_window() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = ApiClient::new(base).with_dedup_window(Duration::from_secs(60));
    let options = QueryOptions::new();

    client.fetch("/resource/products", &options).await?;
    assert_eq!(mock.calls.list_calls(), 1);

    // Within the dedup window: served from cache
    client.revalidate("/resource/products", &options).await?;
    assert_eq!(mock.calls.list_calls(), 1);

    // Forced refresh always refetches
    client.refresh("/resource/products", &options).await?;
    assert_eq!(mock.calls.list_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn fetch_error_carries_the_server_message() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = ApiClient::new(base);

    // No session: delete is rejected before the upstream is touched
    let err = client
        .delete_json("/resource/products/42")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "No autorizado");
    assert_eq!(mock.calls.delete_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn fetch_error_falls_back_to_status_text() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = ApiClient::new(base);

    // Unregistered route: axum's plain 404 has no JSON error field
    let err = client
        .get_json("/resource/orders", &QueryOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Not Found");
    Ok(())
}

#[tokio::test]
async fn mutation_status_transitions_through_terminal_states() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = Arc::new(ApiClient::new(base).with_token(common::session_token()));

    let mutations = ResourceMutations::new(client, "products");
    assert!(!mutations.snapshot().is_loading());
    assert!(!mutations.snapshot().is_success());

    // Success path
    let created = mutations.create(&json!({ "name": "Balanza" })).await?;
    assert_eq!(created, mock.item);
    let snapshot = mutations.snapshot();
    assert!(snapshot.is_success());
    assert_eq!(snapshot.data, Some(mock.item.clone()));
    assert!(snapshot.error.is_none());

    // A new invocation leaves the previous terminal state behind
    let err = mutations.create(&json!({ "name": "" })).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    let snapshot = mutations.snapshot();
    assert!(snapshot.is_error());
    assert!(snapshot.data.is_none());
    assert_eq!(snapshot.error, Some(err));
    Ok(())
}

#[tokio::test]
async fn crud_handle_refreshes_its_list_after_each_mutation() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    let client = Arc::new(ApiClient::new(base).with_token(common::session_token()));

    let crud = ResourceCrud::new(client, "products");

    crud.load().await?;
    assert_eq!(crud.items(), Some(mock.collection.clone()));
    assert_eq!(mock.calls.list_calls(), 1);

    // Cached: a second load does not refetch
    crud.load().await?;
    assert_eq!(mock.calls.list_calls(), 1);

    crud.create_item(&json!({ "name": "Balanza" })).await?;
    assert_eq!(mock.calls.create_calls(), 1);
    assert_eq!(mock.calls.list_calls(), 2);
    assert!(crud.mutation().is_success());

    crud.delete_item("42").await?;
    assert_eq!(mock.calls.delete_calls(), 1);
    assert_eq!(mock.calls.list_calls(), 3);

    crud.refresh().await?;
    assert_eq!(mock.calls.list_calls(), 4);
    Ok(())
}

#[tokio::test]
async fn failed_mutation_is_stored_and_reraised_without_refreshing() -> Result<()> {
    let mock = Arc::new(common::MockContent::default());
    let base = spawn(mock.clone()).await?;
    // No token: writes are rejected at the auth gate
    let client = Arc::new(ApiClient::new(base));

    let crud = ResourceCrud::new(client, "products");
    crud.load().await?;
    assert_eq!(mock.calls.list_calls(), 1);

    let err = crud.create_item(&json!({ "name": "Balanza" })).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(crud.mutation().is_error());

    // No refresh on failure
    assert_eq!(mock.calls.list_calls(), 1);
    assert_eq!(mock.calls.create_calls(), 0);
    Ok(())
}
