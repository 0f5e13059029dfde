pub mod callbacks;
pub mod config;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod id;
pub mod list;
pub mod plugin;
pub mod query;
pub mod repository;
pub mod validation;
pub mod value;

pub use callbacks::{hook_fn, Callbacks, FnHook, Operation, WriteContext, WriteHook, WriteTarget};
pub use config::DatabaseConfig;
pub use descriptor::{BackendKind, ConnectionDescriptor, MySqlOptions, PostgresOptions, SqliteOptions};
pub use entity::Entity;
pub use error::{BoxError, DataError, DataResult, ErrorKind};
pub use id::{generate_id, ID_LENGTH};
pub use list::{ListOptions, ListResult};
pub use plugin::Plugin;
pub use query::{Dialect, QueryBuilder, QueryError};
pub use repository::Repository;
pub use validation::{convert_garde_report, FieldError, ValidationPlugin, VALIDATION_HOOK};
pub use value::Value;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        generate_id, hook_fn, DataError, DataResult, Entity, ErrorKind, ListOptions, ListResult,
        Operation, Plugin, Repository, Value,
    };
}
