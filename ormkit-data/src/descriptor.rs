//! Connection URL parsing.
//!
//! A connection string has the form
//! `scheme://[user[:pass]@]host[:port]/path[?opt=val&...]` and is parsed once
//! into an immutable [`ConnectionDescriptor`]. The scheme selects the backend:
//!
//! | Scheme | Backend |
//! |--------|---------|
//! | `sqlite`, `sqlite3` | SQLite; everything after `://` is the file path (`:memory:` for an in-memory database) |
//! | `mysql`, `mariadb`, `my` | MySQL / MariaDB |
//! | `pg`, `psql`, `pgsql`, `postgres`, `postgresql` | PostgreSQL |
//!
//! Backend specific query options are exposed through [`SqliteOptions`],
//! [`MySqlOptions`] and [`PostgresOptions`].

use std::collections::BTreeMap;

use url::Url;

use crate::error::DataError;

/// The SQL engine a connection string points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Sqlite,
    MySql,
    Postgres,
}

impl BackendKind {
    /// Resolve a URL scheme (case-insensitive).
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(BackendKind::Sqlite),
            "my" | "mysql" | "mariadb" => Some(BackendKind::MySql),
            "pg" | "psql" | "pgsql" | "postgres" | "postgresql" => Some(BackendKind::Postgres),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::MySql => "mysql",
            BackendKind::Postgres => "postgres",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    kind: BackendKind,
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    database: String,
    options: BTreeMap<String, String>,
}

impl ConnectionDescriptor {
    pub fn parse(url: &str) -> Result<Self, DataError> {
        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(DataError::InvalidUrl(format!("missing scheme in '{url}'")));
        };
        let kind = BackendKind::from_scheme(scheme)
            .ok_or_else(|| DataError::UnsupportedScheme(scheme.to_string()))?;

        match kind {
            BackendKind::Sqlite => Self::parse_sqlite(scheme, rest),
            BackendKind::MySql | BackendKind::Postgres => Self::parse_network(kind, url),
        }
    }

    // The url crate would lowercase and reject file names used as hosts,
    // so SQLite paths are taken verbatim.
    fn parse_sqlite(scheme: &str, rest: &str) -> Result<Self, DataError> {
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(DataError::InvalidUrl("sqlite URL has no database path".into()));
        }
        Ok(Self {
            kind: BackendKind::Sqlite,
            scheme: scheme.to_ascii_lowercase(),
            host: None,
            port: None,
            username: None,
            password: None,
            database: path.to_string(),
            options: query.map(parse_query).unwrap_or_default(),
        })
    }

    fn parse_network(kind: BackendKind, url: &str) -> Result<Self, DataError> {
        let parsed = Url::parse(url).map_err(|e| DataError::InvalidUrl(e.to_string()))?;
        let non_empty = |s: Option<&str>| {
            s.filter(|s| !s.is_empty()).map(percent_decode).transpose()
        };

        Ok(Self {
            kind,
            scheme: parsed.scheme().to_string(),
            host: non_empty(parsed.host_str())?,
            port: parsed.port(),
            username: non_empty(Some(parsed.username()))?,
            password: non_empty(parsed.password())?,
            database: percent_decode(parsed.path().trim_start_matches('/'))?,
            options: parsed.query().map(parse_query).unwrap_or_default(),
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Database name, or the file path for SQLite.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Raw query option, if present and non-empty.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            path: self.database.clone(),
            in_memory: self.database == ":memory:",
        }
    }

    pub fn mysql_options(&self) -> MySqlOptions {
        MySqlOptions {
            charset: self.option("charset").map(str::to_string),
            parse_time: self.option("parseTime").and_then(parse_bool),
            loc: self.option("loc").map(str::to_string),
            default_string_size: self
                .option("DefaultStringSize")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            disable_datetime_precision: self.flag("DisableDatetimePrecision"),
            dont_support_rename_index: self.flag("DontSupportRenameIndex"),
            skip_initialize_with_version: self.flag("SkipInitializeWithVersion"),
        }
    }

    pub fn postgres_options(&self) -> PostgresOptions {
        PostgresOptions {
            sslmode: self.option("sslmode").map(str::to_string),
            timezone: self.option("timezone").map(str::to_string),
            prefer_simple_protocol: self.flag("PreferSimpleProtocol"),
            without_returning: self.flag("WithoutReturning"),
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.option(key).and_then(parse_bool).unwrap_or(false)
    }

    /// The connection string with the password masked, for logs.
    pub fn redacted(&self) -> String {
        if self.kind == BackendKind::Sqlite {
            return format!("{}://{}", self.scheme, self.database);
        }
        let mut out = format!("{}://", self.scheme);
        if let Some(user) = &self.username {
            out.push_str(user);
            if self.password.is_some() {
                out.push_str(":***");
            }
            out.push('@');
        }
        if let Some(host) = &self.host {
            out.push_str(host);
        }
        if let Some(port) = self.port {
            out.push_str(&format!(":{port}"));
        }
        out.push('/');
        out.push_str(&self.database);
        out
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("kind", &self.kind)
            .field("url", &self.redacted())
            .field("options", &self.options)
            .finish()
    }
}

/// SQLite settings. Journal mode (WAL), shared cache and foreign key
/// enforcement are always on and not configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub path: String,
    pub in_memory: bool,
}

/// MySQL query options.
///
/// `charset` and `loc` are applied to the session. The remaining flags are
/// schema-generation hints kept for callers that manage DDL themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MySqlOptions {
    pub charset: Option<String>,
    pub parse_time: Option<bool>,
    pub loc: Option<String>,
    pub default_string_size: u32,
    pub disable_datetime_precision: bool,
    pub dont_support_rename_index: bool,
    pub skip_initialize_with_version: bool,
}

/// PostgreSQL query options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresOptions {
    pub sslmode: Option<String>,
    pub timezone: Option<String>,
    /// Disable the prepared statement cache.
    pub prefer_simple_protocol: bool,
    /// Fetch generated identifiers with `LASTVAL()` instead of `RETURNING`.
    pub without_returning: bool,
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Accepts the usual spellings: `1`/`0`, `t`/`f`, `true`/`false`.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn percent_decode(input: &str) -> Result<String, DataError> {
    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| DataError::InvalidUrl(format!("invalid percent-encoding in '{input}': {e}")))
}
