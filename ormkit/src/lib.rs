//! ormkit — a convenience layer over sqlx.
//!
//! This facade crate re-exports the ormkit sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use ormkit::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature    | Default | Crate                          |
//! |------------|---------|--------------------------------|
//! | `sqlite`   | **yes** | `ormkit-data-sqlx/sqlite`      |
//! | `postgres` | no      | `ormkit-data-sqlx/postgres`    |
//! | `mysql`    | no      | `ormkit-data-sqlx/mysql`       |
//! | `full`     | no      | All of the above               |
//!
//! # Example
//!
//! ```ignore
//! use ormkit::prelude::*;
//! use ormkit::sqlx::{FromRow, Sqlite};
//!
//! #[derive(Debug, FromRow, garde::Validate)]
//! struct Post {
//!     #[garde(skip)]
//!     id: i64,
//!     #[garde(length(min = 1))]
//!     title: String,
//! }
//!
//! impl Entity for Post {
//!     fn table_name() -> &'static str { "posts" }
//!     fn columns() -> &'static [&'static str] { &["title"] }
//!     fn id(&self) -> i64 { self.id }
//!     fn set_id(&mut self, id: i64) { self.id = id }
//!     fn values(&self) -> Vec<Value> { vec![Value::from(&self.title)] }
//!     fn validate_fields(&self) -> Result<(), garde::Report> {
//!         garde::Validate::validate(self)
//!     }
//! }
//!
//! let handle = Handle::<Sqlite>::open("sqlite://app.db").await?;
//! let post = ops::save(&handle, Post { id: 0, title: "hello".into() }).await?;
//! match ops::get(&handle, &Post { id: post.id, title: String::new() }).await {
//!     Err(err) if err.is_not_found() => {}
//!     other => println!("{other:?}"),
//! }
//! ```

pub use ormkit_data;
pub use ormkit_data_sqlx;

pub use garde;
pub use sqlx;

pub use ormkit_data::*;
pub use ormkit_data_sqlx::{
    classify, ops, Backend, ErrorDecoder, Handle, SqlxErrorExt, SqlxRepository, SqlxResultExt,
    BATCH_SIZE,
};

/// Unified prelude — import everything with `use ormkit::prelude::*`.
pub mod prelude {
    pub use ormkit_data_sqlx::prelude::*;
    pub use ormkit_data::{DatabaseConfig, ValidationPlugin};
}
