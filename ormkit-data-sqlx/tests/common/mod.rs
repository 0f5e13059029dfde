//! Entities, schema helpers and the backend-independent test suite.
#![allow(dead_code)]

use garde::Validate;
use ormkit_data::{DataError, Entity, ErrorKind, ListOptions, Value};
use ormkit_data_sqlx::{ops, Backend, Handle};
use sqlx::FromRow;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub views: i64,
}

impl Post {
    pub fn new(title: &str) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            views: 0,
        }
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            title: String::new(),
            views: 0,
        }
    }
}

impl Entity for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn columns() -> &'static [&'static str] {
        &["title", "views"]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(&self.title), Value::from(self.views)]
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
}

impl Entity for Comment {
    fn table_name() -> &'static str {
        "comments"
    }

    fn columns() -> &'static [&'static str] {
        &["post_id", "body"]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(self.post_id), Value::from(&self.body)]
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Validate)]
pub struct Account {
    #[garde(skip)]
    pub id: i64,
    #[garde(length(min = 3))]
    pub name: String,
}

impl Entity for Account {
    fn table_name() -> &'static str {
        "accounts"
    }

    fn columns() -> &'static [&'static str] {
        &["name"]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::from(&self.name)]
    }

    fn validate_fields(&self) -> Result<(), garde::Report> {
        Validate::validate(self)
    }
}

pub const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE CHECK (title <> ''),
        views INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES posts(id),
        body TEXT NOT NULL
    )",
    "CREATE TABLE accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
];

pub const POSTGRES_SCHEMA: &[&str] = &[
    "DROP TABLE IF EXISTS comments",
    "DROP TABLE IF EXISTS posts",
    "DROP TABLE IF EXISTS accounts",
    "CREATE TABLE posts (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL UNIQUE CHECK (title <> ''),
        views BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE comments (
        id BIGSERIAL PRIMARY KEY,
        post_id BIGINT NOT NULL REFERENCES posts(id),
        body TEXT NOT NULL
    )",
    "CREATE TABLE accounts (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL
    )",
];

pub const MYSQL_SCHEMA: &[&str] = &[
    "DROP TABLE IF EXISTS comments",
    "DROP TABLE IF EXISTS posts",
    "DROP TABLE IF EXISTS accounts",
    "CREATE TABLE posts (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        title VARCHAR(191) NOT NULL UNIQUE,
        views BIGINT NOT NULL DEFAULT 0,
        CONSTRAINT posts_title_not_empty CHECK (title <> '')
    ) ENGINE = InnoDB",
    "CREATE TABLE comments (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        post_id BIGINT NOT NULL,
        body TEXT NOT NULL,
        FOREIGN KEY (post_id) REFERENCES posts(id)
    ) ENGINE = InnoDB",
    "CREATE TABLE accounts (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(191) NOT NULL
    ) ENGINE = InnoDB",
];

pub async fn apply_schema<DB: Backend>(handle: &Handle<DB>, statements: &[&str]) {
    for statement in statements {
        DB::execute(handle.pool(), statement, Vec::new())
            .await
            .unwrap_or_else(|e| panic!("schema statement failed: {e}\n{statement}"));
    }
}

fn posts(n: usize) -> Vec<Post> {
    (0..n).map(|i| Post::new(&format!("post-{i}"))).collect()
}

pub async fn pagination_is_gap_free<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    ops::create_in_batches(handle, posts(7)).await.unwrap();

    let mut options = ListOptions::page(3).order("id");
    let mut seen = Vec::new();
    let mut pages = 0;
    loop {
        let page = ops::list(handle, None::<&Post>, options.clone()).await.unwrap();
        if page.is_empty() {
            break;
        }
        pages += 1;
        options = page.next_options(&options);
        seen.extend(page.into_iter().map(|p| p.id));
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 7);
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, seen, "pages must not repeat or reorder rows");
}

pub async fn snapshot_bound_hides_new_rows<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    ops::save(handle, Post::new("first")).await.unwrap();

    let options = ListOptions::page(1);
    let first = ops::list(handle, None::<&Post>, options.clone()).await.unwrap();
    assert_eq!(first.count, 1);
    assert_eq!(first.offset, 1);
    assert!(first.max_row_id.is_some());

    ops::save(handle, Post::new("second")).await.unwrap();

    let second = ops::list(handle, None::<&Post>, first.next_options(&options))
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(second.max_row_id, first.max_row_id);
}

pub async fn empty_table_pins_bound_to_zero<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let options = ListOptions::page(10);
    let page = ops::list(handle, None::<&Post>, options.clone()).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.max_row_id, Some(0));

    ops::save(handle, Post::new("late")).await.unwrap();
    let next = ops::list(handle, None::<&Post>, page.next_options(&options))
        .await
        .unwrap();
    assert!(next.is_empty());
}

pub async fn save_inserts_then_updates<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let mut post = ops::save(handle, Post::new("draft")).await.unwrap();
    assert!(post.id > 0);

    post.title = "published".into();
    post.views = 3;
    let post = ops::save(handle, post).await.unwrap();

    let stored = ops::get(handle, &Post::with_id(post.id)).await.unwrap();
    assert_eq!(stored, post);
    assert_eq!(ops::count(handle, None::<&Post>).await.unwrap(), 1);

    // An identifier that is not stored yet is inserted as given.
    let explicit = Post {
        id: post.id + 100,
        title: "explicit".into(),
        views: 0,
    };
    ops::save(handle, explicit.clone()).await.unwrap();
    let stored = ops::get(handle, &Post::with_id(explicit.id)).await.unwrap();
    assert_eq!(stored.title, "explicit");
}

pub async fn delete_then_get_is_not_found<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let post = ops::save(handle, Post::new("doomed")).await.unwrap();
    ops::save(handle, Post::new("survivor")).await.unwrap();

    let predicate = Post::new("doomed");
    assert_eq!(ops::delete(handle, Some(&predicate)).await.unwrap(), 1);

    let err = ops::get(handle, &predicate).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    let err = ops::get(handle, &Post::with_id(post.id)).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert_eq!(ops::count(handle, None::<&Post>).await.unwrap(), 1);

    assert_eq!(ops::delete(handle, None::<&Post>).await.unwrap(), 1);
    assert_eq!(ops::count(handle, None::<&Post>).await.unwrap(), 0);
}

pub async fn get_reports_multiple_results<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    for title in ["a", "b", "c"] {
        let mut post = Post::new(title);
        post.views = if title == "c" { 1 } else { 5 };
        ops::save(handle, post).await.unwrap();
    }

    let popular = Post {
        views: 5,
        ..Post::with_id(0)
    };
    let err = ops::get(handle, &popular).await.unwrap_err();
    assert!(
        matches!(err, DataError::MultipleResults { found: 2, .. }),
        "{err}"
    );
    assert_eq!(ops::count(handle, Some(&popular)).await.unwrap(), 2);

    let unpopular = Post {
        views: 1,
        ..Post::with_id(0)
    };
    assert_eq!(ops::get(handle, &unpopular).await.unwrap().title, "c");
}

pub async fn constraint_errors_are_classified<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let err = ops::save(handle, Post::new("")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CheckConstraintFailed, "{err}");

    let orphan = Comment {
        id: 0,
        post_id: 9_999,
        body: "hello?".into(),
    };
    let err = ops::save(handle, orphan).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForeignKeyConstraintFailed, "{err}");

    ops::save(handle, Post::new("unique")).await.unwrap();
    let err = ops::save(handle, Post::new("unique")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniqueConstraintFailed, "{err}");
    assert!(std::error::Error::source(&err).is_some());
}

pub async fn validation_rejects_writes<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Account: for<'r> FromRow<'r, DB::Row>,
{
    let short = Account {
        id: 0,
        name: "al".into(),
    };
    let err = ops::save(handle, short).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    let DataError::Validation(fields) = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(fields[0].field, "name");

    let batch = vec![
        Account { id: 0, name: "alice".into() },
        Account { id: 0, name: "bo".into() },
    ];
    let err = ops::create_in_batches(handle, batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(ops::count(handle, None::<&Account>).await.unwrap(), 0);

    let mut account = ops::save(handle, Account { id: 0, name: "alice".into() })
        .await
        .unwrap();
    account.name = "x".into();
    let err = ops::save(handle, account.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    let stored = ops::get(handle, &Account { id: account.id, name: String::new() })
        .await
        .unwrap();
    assert_eq!(stored.name, "alice");
}

pub async fn batches_span_multiple_statements<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let total = ormkit_data_sqlx::BATCH_SIZE * 2 + 5;
    let created = ops::create_in_batches(handle, posts(total)).await.unwrap();
    assert_eq!(created.len(), total);

    for post in [&created[0], &created[150], &created[total - 1]] {
        let stored = ops::get(handle, &Post::with_id(post.id)).await.unwrap();
        assert_eq!(stored.title, post.title);
    }
    assert_eq!(ops::count(handle, None::<&Post>).await.unwrap(), total as u64);
}

pub async fn failed_batch_keeps_earlier_batches<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let mut batch = posts(150);
    batch[120].title = batch[10].title.clone();

    let err = ops::create_in_batches(handle, batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UniqueConstraintFailed, "{err}");
    assert_eq!(
        ops::count(handle, None::<&Post>).await.unwrap(),
        ormkit_data_sqlx::BATCH_SIZE as u64
    );
}

pub async fn queries_select_by_range<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let created = ops::create_in_batches(handle, posts(10)).await.unwrap();
    for (post, views) in created.iter().zip(0i64..) {
        let mut post = post.clone();
        post.views = views * 10;
        ops::save(handle, post).await.unwrap();
    }

    let popular = ops::query::<Post, DB>().where_gte("views", 50i64);
    assert_eq!(ops::count_where(handle, popular.clone()).await.unwrap(), 5);

    let found: Vec<Post> = ops::find(handle, popular.order_by("views", false).limit(2))
        .await
        .unwrap();
    let views: Vec<_> = found.iter().map(|p| p.views).collect();
    assert_eq!(views, vec![90, 80]);

    let early = ops::query::<Post, DB>().where_lte("id", created[2].id);
    assert_eq!(ops::count_where(handle, early).await.unwrap(), 3);

    let one: Post = ops::find_one(
        handle,
        ops::query::<Post, DB>()
            .where_gt("views", 30i64)
            .where_lt("views", 50i64),
    )
    .await
    .unwrap();
    assert_eq!(one.views, 40);

    let err = ops::find_one::<Post, DB>(handle, ops::query::<Post, DB>().where_gt("views", 70i64))
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::MultipleResults { found: 2, .. }), "{err}");

    let err = ops::find_one::<Post, DB>(handle, ops::query::<Post, DB>().where_gt("views", 1000i64))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

/// Identifiers handed back by a batch insert must belong to the batch's own
/// rows even while another connection inserts into the same table.
pub async fn batch_ids_survive_concurrent_writers<DB>(handle: &Handle<DB>)
where
    DB: Backend,
    Post: for<'r> FromRow<'r, DB::Row>,
{
    let (created, others) = tokio::join!(
        ops::create_in_batches(handle, posts(150)),
        async {
            for i in 0..30 {
                ops::save(handle, Post::new(&format!("other-{i}"))).await?;
                tokio::task::yield_now().await;
            }
            Ok::<_, DataError>(())
        }
    );
    others.unwrap();

    for post in created.unwrap() {
        let stored = ops::get(handle, &Post::with_id(post.id)).await.unwrap();
        assert_eq!(stored.title, post.title);
    }
    assert_eq!(ops::count(handle, None::<&Post>).await.unwrap(), 180);
}
