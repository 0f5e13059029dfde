use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use ormkit_data::{BackendKind, ConnectionDescriptor, DataError, Value};
use sqlx::pool::PoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Pool, Sqlite};

use super::{bind_values, ids_from_last, Backend};

impl Backend for Sqlite {
    const KIND: BackendKind = BackendKind::Sqlite;

    fn connect_options(descriptor: &ConnectionDescriptor) -> Result<SqliteConnectOptions, DataError> {
        let options = descriptor.sqlite_options();
        let connect = if options.in_memory {
            // A uniquely named shared-cache database, visible to every pooled connection.
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DataError::InvalidUrl(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&options.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .shared_cache(true)
        };
        Ok(connect.foreign_keys(true))
    }

    fn tune_pool(descriptor: &ConnectionDescriptor, options: PoolOptions<Self>) -> PoolOptions<Self> {
        if !descriptor.sqlite_options().in_memory {
            return options;
        }
        // The database lives as long as one connection stays open.
        options
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    }

    query_methods!();

    fn insert<'a>(
        pool: &'a Pool<Self>,
        sql: &'a str,
        params: Vec<Value>,
        rows: usize,
        _returning: bool,
    ) -> impl Future<Output = Result<Vec<i64>, sqlx::Error>> + Send + 'a {
        async move {
            let args = bind_values::<Self>(params)?;
            let result = sqlx::query_with::<Self, _>(sql, args).execute(pool).await?;
            Ok(ids_from_last(result.last_insert_rowid(), rows))
        }
    }
}
