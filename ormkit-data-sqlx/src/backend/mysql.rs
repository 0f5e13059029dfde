use std::future::Future;

use ormkit_data::{BackendKind, ConnectionDescriptor, DataError, Value};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{MySql, Pool};

use super::{bind_values, ids_from_first, Backend};

impl Backend for MySql {
    const KIND: BackendKind = BackendKind::MySql;

    fn connect_options(descriptor: &ConnectionDescriptor) -> Result<MySqlConnectOptions, DataError> {
        let options = descriptor.mysql_options();
        let mut connect = MySqlConnectOptions::new()
            .host(descriptor.host().unwrap_or("localhost"))
            .port(descriptor.port().unwrap_or(3306));
        if let Some(username) = descriptor.username() {
            connect = connect.username(username);
        }
        if let Some(password) = descriptor.password() {
            connect = connect.password(password);
        }
        if !descriptor.database().is_empty() {
            connect = connect.database(descriptor.database());
        }
        if let Some(charset) = &options.charset {
            connect = connect.charset(charset);
        }
        if let Some(loc) = &options.loc {
            connect = connect.timezone(Some(session_time_zone(loc)));
        }
        Ok(connect)
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
            // LAST_INSERT_ID() is the first identifier of a multi-row insert.
            Ok(ids_from_first(result.last_insert_id() as i64, rows))
        }
    }
}

/// `loc` names a location; the session `time_zone` wants an offset or a zone name.
fn session_time_zone(loc: &str) -> String {
    match loc {
        "UTC" | "utc" => "+00:00".to_string(),
        "Local" | "local" => chrono::Local::now().offset().to_string(),
        other => other.to_string(),
    }
}
