use crate::validation::FieldError;

/// Boxed driver error kept as the cause of a classified [`DataError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Portable classification of a data-layer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CheckConstraintFailed,
    ForeignKeyConstraintFailed,
    UniqueConstraintFailed,
    NotFound,
    MultipleResults,
    /// A write callback rejected the entity before it reached storage.
    ValidationFailed,
    /// The connection URL or configuration could not be used.
    InvalidConfiguration,
    Unclassified,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::CheckConstraintFailed => "check constraint failed",
            ErrorKind::ForeignKeyConstraintFailed => "foreign key constraint failed",
            ErrorKind::UniqueConstraintFailed => "unique constraint failed",
            ErrorKind::NotFound => "not found",
            ErrorKind::MultipleResults => "multiple results",
            ErrorKind::ValidationFailed => "validation failed",
            ErrorKind::InvalidConfiguration => "invalid configuration",
            ErrorKind::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in the data layer.
///
/// Constraint variants and `Unclassified` keep the original driver error,
/// reachable through [`std::error::Error::source`].
#[derive(Debug)]
pub enum DataError {
    CheckConstraintFailed(BoxError),
    ForeignKeyConstraintFailed(BoxError),
    UniqueConstraintFailed(BoxError),
    NotFound(String),
    MultipleResults { table: String, found: usize },
    Validation(Vec<FieldError>),
    UnsupportedScheme(String),
    InvalidUrl(String),
    BackendMismatch { expected: String, found: String },
    Config(String),
    Unclassified(BoxError),
}

impl DataError {
    /// Construct an `Unclassified` variant from any error type.
    pub fn unclassified(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Unclassified(Box::new(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::CheckConstraintFailed(_) => ErrorKind::CheckConstraintFailed,
            DataError::ForeignKeyConstraintFailed(_) => ErrorKind::ForeignKeyConstraintFailed,
            DataError::UniqueConstraintFailed(_) => ErrorKind::UniqueConstraintFailed,
            DataError::NotFound(_) => ErrorKind::NotFound,
            DataError::MultipleResults { .. } => ErrorKind::MultipleResults,
            DataError::Validation(_) => ErrorKind::ValidationFailed,
            DataError::UnsupportedScheme(_)
            | DataError::InvalidUrl(_)
            | DataError::BackendMismatch { .. }
            | DataError::Config(_) => ErrorKind::InvalidConfiguration,
            DataError::Unclassified(_) => ErrorKind::Unclassified,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_multiple_results(&self) -> bool {
        self.kind() == ErrorKind::MultipleResults
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::CheckConstraintFailed(err) => write!(f, "Check constraint failed: {err}"),
            DataError::ForeignKeyConstraintFailed(err) => {
                write!(f, "Foreign key constraint failed: {err}")
            }
            DataError::UniqueConstraintFailed(err) => write!(f, "Unique constraint failed: {err}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::MultipleResults { table, found } => {
                write!(f, "Multiple results: {found} rows of {table} matched, expected one")
            }
            DataError::Validation(errors) => {
                write!(f, "Validation failed:")?;
                for error in errors {
                    write!(f, "\n  - {}: {}", error.field, error.message)?;
                }
                Ok(())
            }
            DataError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported connection scheme: {scheme}")
            }
            DataError::InvalidUrl(msg) => write!(f, "Invalid connection URL: {msg}"),
            DataError::BackendMismatch { expected, found } => {
                write!(f, "Backend mismatch: handle expects {expected}, URL selects {found}")
            }
            DataError::Config(msg) => write!(f, "Config error: {msg}"),
            DataError::Unclassified(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::CheckConstraintFailed(err)
            | DataError::ForeignKeyConstraintFailed(err)
            | DataError::UniqueConstraintFailed(err)
            | DataError::Unclassified(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Convenience alias for data-layer results.
pub type DataResult<T> = Result<T, DataError>;
