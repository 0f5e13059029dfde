//! Mapping of driver errors to [`DataError`] kinds.
//!
//! Each backend reports constraint violations with its own codes. A
//! [`ErrorDecoder`] is picked once when a handle is opened and every storage
//! error goes through [`classify`] before it reaches the caller. Decoders test
//! CHECK, then FOREIGN KEY, then UNIQUE; the first match wins.

use ormkit_data::{BackendKind, DataError};
use sqlx::error::{DatabaseError, ErrorKind as DbErrorKind};

/// The constraint family a driver error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Check,
    ForeignKey,
    Unique,
}

/// Backend specific reader of driver error codes.
pub trait ErrorDecoder: Send + Sync + 'static {
    fn backend(&self) -> BackendKind;

    fn decode(&self, err: &dyn DatabaseError) -> Option<ConstraintKind>;
}

/// Turn a driver error into a classified [`DataError`].
///
/// `RowNotFound` becomes `NotFound`; anything the decoder does not recognize
/// is kept as `Unclassified`. The driver error stays reachable through
/// [`std::error::Error::source`].
pub fn classify(decoder: &dyn ErrorDecoder, err: sqlx::Error) -> DataError {
    let constraint = match &err {
        sqlx::Error::RowNotFound => return DataError::NotFound("row not found".into()),
        sqlx::Error::Database(db) => decoder.decode(&**db),
        _ => None,
    };
    let classified = match constraint {
        Some(ConstraintKind::Check) => DataError::CheckConstraintFailed(Box::new(err)),
        Some(ConstraintKind::ForeignKey) => DataError::ForeignKeyConstraintFailed(Box::new(err)),
        Some(ConstraintKind::Unique) => DataError::UniqueConstraintFailed(Box::new(err)),
        None => DataError::Unclassified(Box::new(err)),
    };
    tracing::debug!(backend = %decoder.backend(), kind = %classified.kind(), "classified storage error");
    classified
}

// Fallback shared by all decoders when no code matched.
fn from_kind(err: &dyn DatabaseError) -> Option<ConstraintKind> {
    match err.kind() {
        DbErrorKind::CheckViolation => Some(ConstraintKind::Check),
        DbErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
        DbErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
        _ => None,
    }
}

fn from_message(message: &str, patterns: [&str; 3]) -> Option<ConstraintKind> {
    let [check, foreign_key, unique] = patterns;
    if message.contains(check) {
        Some(ConstraintKind::Check)
    } else if message.contains(foreign_key) {
        Some(ConstraintKind::ForeignKey)
    } else if message.contains(unique) {
        Some(ConstraintKind::Unique)
    } else {
        None
    }
}

/// Extended result codes 275, 787, 2067 and 1555.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDecoder;

impl ErrorDecoder for SqliteDecoder {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn decode(&self, err: &dyn DatabaseError) -> Option<ConstraintKind> {
        let by_code = match err.code().as_deref() {
            Some("275") => Some(ConstraintKind::Check),
            Some("787") => Some(ConstraintKind::ForeignKey),
            Some("2067") | Some("1555") => Some(ConstraintKind::Unique),
            _ => None,
        };
        by_code.or_else(|| from_kind(err)).or_else(|| {
            from_message(
                err.message(),
                [
                    "CHECK constraint failed",
                    "FOREIGN KEY constraint failed",
                    "UNIQUE constraint failed",
                ],
            )
        })
    }
}

/// SQLSTATE 23514, 23503 and 23505.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDecoder;

impl ErrorDecoder for PostgresDecoder {
    fn backend(&self) -> BackendKind {
        BackendKind::Postgres
    }

    fn decode(&self, err: &dyn DatabaseError) -> Option<ConstraintKind> {
        let by_code = match err.code().as_deref() {
            Some("23514") => Some(ConstraintKind::Check),
            Some("23503") => Some(ConstraintKind::ForeignKey),
            Some("23505") => Some(ConstraintKind::Unique),
            _ => None,
        };
        by_code.or_else(|| from_kind(err))
    }
}

/// Server error numbers 3819, 1216/1217/1451/1452 and 1062/1586.
///
/// The numbers are only reachable with the `mysql` feature; otherwise the
/// driver's error kind and message are used.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDecoder;

impl MySqlDecoder {
    pub fn from_number(number: u16) -> Option<ConstraintKind> {
        match number {
            3819 => Some(ConstraintKind::Check),
            1216 | 1217 | 1451 | 1452 => Some(ConstraintKind::ForeignKey),
            1062 | 1586 => Some(ConstraintKind::Unique),
            _ => None,
        }
    }
}

impl ErrorDecoder for MySqlDecoder {
    fn backend(&self) -> BackendKind {
        BackendKind::MySql
    }

    fn decode(&self, err: &dyn DatabaseError) -> Option<ConstraintKind> {
        #[cfg(feature = "mysql")]
        if let Some(mysql) = err.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            if let Some(kind) = Self::from_number(mysql.number()) {
                return Some(kind);
            }
        }
        from_kind(err).or_else(|| {
            from_message(
                err.message(),
                ["Check constraint", "foreign key constraint fails", "Duplicate entry"],
            )
        })
    }
}

/// The decoder for `kind`.
pub fn decoder_for(kind: BackendKind) -> &'static dyn ErrorDecoder {
    match kind {
        BackendKind::Sqlite => &SqliteDecoder,
        BackendKind::MySql => &MySqlDecoder,
        BackendKind::Postgres => &PostgresDecoder,
    }
}
