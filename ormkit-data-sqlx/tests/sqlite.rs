#![cfg(feature = "sqlite")]

mod common;

use common::*;
use ormkit_data::{
    hook_fn, DataError, DatabaseConfig, ErrorKind, ListOptions, Operation, Repository,
    VALIDATION_HOOK,
};
use ormkit_data_sqlx::{ops, Handle, SqlxRepository, SqlxResultExt};
use sqlx::Sqlite;
use tempfile::TempDir;

async fn open() -> (TempDir, Handle<Sqlite>) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let handle = Handle::<Sqlite>::open(&url).await.unwrap();
    apply_schema(&handle, SQLITE_SCHEMA).await;
    (dir, handle)
}

#[tokio::test]
async fn test_pagination_is_gap_free() {
    let (_dir, handle) = open().await;
    pagination_is_gap_free(&handle).await;
}

#[tokio::test]
async fn test_snapshot_bound_hides_new_rows() {
    let (_dir, handle) = open().await;
    snapshot_bound_hides_new_rows(&handle).await;
}

#[tokio::test]
async fn test_empty_table_pins_bound_to_zero() {
    let (_dir, handle) = open().await;
    empty_table_pins_bound_to_zero(&handle).await;
}

#[tokio::test]
async fn test_save_inserts_then_updates() {
    let (_dir, handle) = open().await;
    save_inserts_then_updates(&handle).await;
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let (_dir, handle) = open().await;
    delete_then_get_is_not_found(&handle).await;
}

#[tokio::test]
async fn test_get_reports_multiple_results() {
    let (_dir, handle) = open().await;
    get_reports_multiple_results(&handle).await;
}

#[tokio::test]
async fn test_constraint_errors_are_classified() {
    let (_dir, handle) = open().await;
    constraint_errors_are_classified(&handle).await;
}

#[tokio::test]
async fn test_validation_rejects_writes() {
    let (_dir, handle) = open().await;
    validation_rejects_writes(&handle).await;
}

#[tokio::test]
async fn test_batches_span_multiple_statements() {
    let (_dir, handle) = open().await;
    batches_span_multiple_statements(&handle).await;
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_batches() {
    let (_dir, handle) = open().await;
    failed_batch_keeps_earlier_batches(&handle).await;
}

#[tokio::test]
async fn test_queries_select_by_range() {
    let (_dir, handle) = open().await;
    queries_select_by_range(&handle).await;
}

#[tokio::test]
async fn test_open_installs_validation_once() {
    let (_dir, handle) = open().await;
    handle.use_plugin(ormkit_data::ValidationPlugin).unwrap();
    assert_eq!(
        handle.callbacks().names(Operation::Create),
        vec![VALIDATION_HOOK.to_string()]
    );
    assert_eq!(
        handle.callbacks().names(Operation::Update),
        vec![VALIDATION_HOOK.to_string()]
    );
}

#[tokio::test]
async fn test_custom_hook_aborts_write() {
    let (_dir, handle) = open().await;
    handle.callbacks().register(
        Operation::Create,
        "read-only",
        hook_fn(|ctx| Err(DataError::Config(format!("{} is read-only", ctx.table)))),
    );

    let err = ops::save(&handle, Post::new("blocked")).await.unwrap_err();
    assert!(matches!(err, DataError::Config(msg) if msg == "posts is read-only"));
    assert_eq!(ops::count(&handle, None::<&Post>).await.unwrap(), 0);

    assert!(handle.callbacks().remove(Operation::Create, "read-only"));
    ops::save(&handle, Post::new("allowed")).await.unwrap();
}

#[tokio::test]
async fn test_repository_trait() {
    let (_dir, handle) = open().await;
    let repo = SqlxRepository::<Post, Sqlite>::new(handle.clone());

    let created = repo
        .create_in_batches(vec![Post::new("one"), Post::new("two")])
        .await
        .unwrap();
    assert!(created.iter().all(|p| p.id > 0));
    assert_eq!(repo.count(None).await.unwrap(), 2);

    let page = repo
        .list(None, ListOptions::page(10).order("title desc"))
        .await
        .unwrap();
    let titles: Vec<_> = page.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["two", "one"]);

    let one = repo.get(&Post::new("one")).await.unwrap();
    assert_eq!(one.id, created[0].id);
    assert_eq!(repo.delete(Some(&one)).await.unwrap(), 1);
    assert!(repo.get(&one).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_invalid_order_is_rejected() {
    let (_dir, handle) = open().await;
    let err = ops::list(
        &handle,
        None::<&Post>,
        ListOptions::page(5).order("id; DROP TABLE posts"),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unclassified);
    assert_eq!(ops::count(&handle, None::<&Post>).await.unwrap(), 0);
}

#[tokio::test]
async fn test_raw_query_classification() {
    let (_dir, handle) = open().await;
    let err = sqlx::query("SELECT * FROM missing_table")
        .fetch_all(handle.pool())
        .await
        .classified(handle.decoder())
        .err()
        .expect("missing table must fail");
    assert_eq!(err.kind(), ErrorKind::Unclassified);

    let err = sqlx::query("SELECT 1 WHERE 0")
        .fetch_one(handle.pool())
        .await
        .classified(handle.decoder())
        .err()
        .expect("empty result must fail");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_in_memory_database_is_shared_by_the_pool() {
    init_tracing();
    let config = DatabaseConfig {
        max_connections: 4,
        ..DatabaseConfig::new("sqlite://:memory:")
    };
    let handle = Handle::<Sqlite>::open_with(&config).await.unwrap();
    apply_schema(&handle, SQLITE_SCHEMA).await;

    // Hold a connection so the next statement runs on another one.
    let _held = handle.pool().acquire().await.unwrap();
    ops::save(&handle, Post::new("in memory")).await.unwrap();
    assert_eq!(ops::count(&handle, None::<&Post>).await.unwrap(), 1);
    drop(_held);
    handle.close().await;
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let err = Handle::<Sqlite>::open("ftp://host/db").await.unwrap_err();
    assert!(matches!(err, DataError::UnsupportedScheme(ref s) if s == "ftp"));
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}

#[tokio::test]
async fn test_backend_mismatch() {
    let err = Handle::<Sqlite>::open("postgres://app@localhost/app")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::BackendMismatch { ref expected, ref found } if expected == "sqlite" && found == "postgres"
    ));
}

#[tokio::test]
async fn test_close_rejects_further_work() {
    let (_dir, handle) = open().await;
    handle.close().await;
    let err = ops::count(&handle, None::<&Post>).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unclassified);
}
