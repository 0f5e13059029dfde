use std::future::Future;
use std::str::FromStr;

use ormkit_data::{BackendKind, ConnectionDescriptor, DataError, Value};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Pool, Postgres};

use super::{bind_values, Backend};

impl Backend for Postgres {
    const KIND: BackendKind = BackendKind::Postgres;

    fn connect_options(descriptor: &ConnectionDescriptor) -> Result<PgConnectOptions, DataError> {
        let options = descriptor.postgres_options();
        let mut connect = PgConnectOptions::new()
            .host(descriptor.host().unwrap_or("localhost"))
            .port(descriptor.port().unwrap_or(5432));
        if let Some(username) = descriptor.username() {
            connect = connect.username(username);
        }
        if let Some(password) = descriptor.password() {
            connect = connect.password(password);
        }
        if !descriptor.database().is_empty() {
            connect = connect.database(descriptor.database());
        }
        if let Some(mode) = &options.sslmode {
            let mode = PgSslMode::from_str(mode)
                .map_err(|e| DataError::InvalidUrl(format!("sslmode: {e}")))?;
            connect = connect.ssl_mode(mode);
        }
        if let Some(timezone) = &options.timezone {
            connect = connect.options([("TimeZone", timezone.as_str())]);
        }
        if options.prefer_simple_protocol {
            connect = connect.statement_cache_capacity(0);
        }
        Ok(connect)
    }

    fn returning(descriptor: &ConnectionDescriptor) -> bool {
        !descriptor.postgres_options().without_returning
    }

    // Sequence values are handed out to concurrent sessions interleaved, so
    // LASTVAL() only identifies the row of a single-row statement.
    fn batch_ids(returning: bool) -> bool {
        returning
    }

    query_methods!();

    fn insert<'a>(
        pool: &'a Pool<Self>,
        sql: &'a str,
        params: Vec<Value>,
        rows: usize,
        returning: bool,
    ) -> impl Future<Output = Result<Vec<i64>, sqlx::Error>> + Send + 'a {
        async move {
            let args = bind_values::<Self>(params)?;
            if returning {
                return sqlx::query_scalar_with::<Self, i64, _>(sql, args)
                    .fetch_all(pool)
                    .await;
            }
            debug_assert_eq!(rows, 1);
            // LASTVAL() is per session, so both statements share one connection.
            let mut conn = pool.acquire().await?;
            sqlx::query_with::<Self, _>(sql, args).execute(&mut *conn).await?;
            let last: i64 = sqlx::query_scalar("SELECT CAST(LASTVAL() AS BIGINT)")
                .fetch_one(&mut *conn)
                .await?;
            Ok(vec![last])
        }
    }

    fn insert_each<'a>(
        pool: &'a Pool<Self>,
        statements: Vec<(String, Vec<Value>)>,
        _returning: bool,
    ) -> impl Future<Output = Result<Vec<i64>, sqlx::Error>> + Send + 'a {
        async move {
            // The transaction pins one session for LASTVAL() and keeps the batch atomic.
            let mut tx = pool.begin().await?;
            let mut ids = Vec::with_capacity(statements.len());
            for (sql, params) in statements {
                let args = bind_values::<Self>(params)?;
                sqlx::query_with::<Self, _>(&sql, args).execute(&mut *tx).await?;
                let id: i64 = sqlx::query_scalar("SELECT CAST(LASTVAL() AS BIGINT)")
                    .fetch_one(&mut *tx)
                    .await?;
                ids.push(id);
            }
            tx.commit().await?;
            Ok(ids)
        }
    }
}
