//! Driver glue for each supported engine.
//!
//! [`Backend`] extends [`sqlx::Database`] with what a handle needs: turning a
//! [`ConnectionDescriptor`] into connect options, picking the error decoder
//! and running statements with [`Value`] parameters. Implementations are
//! concrete per driver and gated by the `sqlite`, `mysql` and `postgres`
//! features.

use std::future::Future;

use chrono::{DateTime, Utc};
use ormkit_data::{BackendKind, ConnectionDescriptor, DataError, Value};
use sqlx::pool::PoolOptions;
use sqlx::{Arguments, Connection, Database, Encode, FromRow, Pool, Type};

use crate::decode::{decoder_for, ErrorDecoder};

/// Connect options of a backend's connection type.
pub type ConnectOptionsOf<DB> = <<DB as Database>::Connection as Connection>::Options;

pub trait Backend: Database {
    const KIND: BackendKind;

    fn connect_options(
        descriptor: &ConnectionDescriptor,
    ) -> Result<ConnectOptionsOf<Self>, DataError>;

    /// Adjust pool settings the descriptor requires.
    fn tune_pool(
        _descriptor: &ConnectionDescriptor,
        options: PoolOptions<Self>,
    ) -> PoolOptions<Self> {
        options
    }

    fn decoder() -> &'static dyn ErrorDecoder {
        decoder_for(Self::KIND)
    }

    /// Whether inserts report generated identifiers with `RETURNING`.
    fn returning(_descriptor: &ConnectionDescriptor) -> bool {
        false
    }

    /// Whether one multi-row INSERT can report the identifiers of all its
    /// rows. When it cannot, batches go through [`Backend::insert_each`].
    fn batch_ids(_returning: bool) -> bool {
        true
    }

    fn fetch_all<'a, T>(
        pool: &'a Pool<Self>,
        sql: &'a str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<T>, sqlx::Error>> + Send + 'a
    where
        T: for<'r> FromRow<'r, Self::Row> + Send + Unpin + 'a;

    /// First column of the single result row, for `COUNT` and `MAX` queries.
    fn fetch_i64<'a>(
        pool: &'a Pool<Self>,
        sql: &'a str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Option<i64>, sqlx::Error>> + Send + 'a;

    /// Run a statement and return the number of rows affected.
    fn execute<'a>(
        pool: &'a Pool<Self>,
        sql: &'a str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send + 'a;

    /// Run an INSERT of `rows` rows and return their generated identifiers.
    fn insert<'a>(
        pool: &'a Pool<Self>,
        sql: &'a str,
        params: Vec<Value>,
        rows: usize,
        returning: bool,
    ) -> impl Future<Output = Result<Vec<i64>, sqlx::Error>> + Send + 'a;

    /// Run single-row INSERT statements and return their identifiers in order.
    fn insert_each<'a>(
        pool: &'a Pool<Self>,
        statements: Vec<(String, Vec<Value>)>,
        returning: bool,
    ) -> impl Future<Output = Result<Vec<i64>, sqlx::Error>> + Send + 'a {
        async move {
            let mut ids = Vec::with_capacity(statements.len());
            for (sql, params) in statements {
                ids.extend(Self::insert(pool, &sql, params, 1, returning).await?);
            }
            Ok(ids)
        }
    }
}

/// Encode `params` into the driver's argument buffer.
pub(crate) fn bind_values<'q, DB>(params: Vec<Value>) -> Result<DB::Arguments<'q>, sqlx::Error>
where
    DB: Database,
    Option<bool>: Encode<'q, DB> + Type<DB>,
    Option<i64>: Encode<'q, DB> + Type<DB>,
    Option<f64>: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
    Option<Vec<u8>>: Encode<'q, DB> + Type<DB>,
    Option<DateTime<Utc>>: Encode<'q, DB> + Type<DB>,
{
    let mut args = DB::Arguments::<'q>::default();
    for value in params {
        match value {
            Value::Bool(v) => args.add(v),
            Value::Int(v) => args.add(v),
            Value::Float(v) => args.add(v),
            Value::Text(v) => args.add(v),
            Value::Bytes(v) => args.add(v),
            Value::Timestamp(v) => args.add(v),
        }
        .map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

/// Identifiers of `rows` consecutive inserts, given the first one.
pub(crate) fn ids_from_first(first: i64, rows: usize) -> Vec<i64> {
    (0..rows as i64).map(|i| first + i).collect()
}

/// Identifiers of `rows` consecutive inserts, given the last one.
pub(crate) fn ids_from_last(last: i64, rows: usize) -> Vec<i64> {
    ids_from_first(last - rows as i64 + 1, rows)
}

/// Query methods shared by every driver; the bodies only differ by type.
macro_rules! query_methods {
    () => {
        fn fetch_all<'a, T>(
            pool: &'a ::sqlx::Pool<Self>,
            sql: &'a str,
            params: Vec<::ormkit_data::Value>,
        ) -> impl ::std::future::Future<Output = Result<Vec<T>, ::sqlx::Error>> + Send + 'a
        where
            T: for<'r> ::sqlx::FromRow<'r, Self::Row> + Send + Unpin + 'a,
        {
            async move {
                let args = $crate::backend::bind_values::<Self>(params)?;
                ::sqlx::query_as_with::<Self, T, _>(sql, args)
                    .fetch_all(pool)
                    .await
            }
        }

        fn fetch_i64<'a>(
            pool: &'a ::sqlx::Pool<Self>,
            sql: &'a str,
            params: Vec<::ormkit_data::Value>,
        ) -> impl ::std::future::Future<Output = Result<Option<i64>, ::sqlx::Error>> + Send + 'a
        {
            async move {
                let args = $crate::backend::bind_values::<Self>(params)?;
                ::sqlx::query_scalar_with::<Self, Option<i64>, _>(sql, args)
                    .fetch_one(pool)
                    .await
            }
        }

        fn execute<'a>(
            pool: &'a ::sqlx::Pool<Self>,
            sql: &'a str,
            params: Vec<::ormkit_data::Value>,
        ) -> impl ::std::future::Future<Output = Result<u64, ::sqlx::Error>> + Send + 'a {
            async move {
                let args = $crate::backend::bind_values::<Self>(params)?;
                let result = ::sqlx::query_with::<Self, _>(sql, args)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected())
            }
        }
    };
}

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;
