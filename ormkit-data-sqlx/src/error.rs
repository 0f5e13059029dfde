use ormkit_data::DataError;

use crate::decode::{classify, ErrorDecoder};

/// Extension trait for converting `sqlx::Error` into a classified `DataError`.
///
/// Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
/// implemented here, and classification needs the handle's decoder anyway.
pub trait SqlxErrorExt {
    fn classify(self, decoder: &dyn ErrorDecoder) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn classify(self, decoder: &dyn ErrorDecoder) -> DataError {
        classify(decoder, self)
    }
}

/// Classify the error of a driver result; `Ok` values pass through untouched.
pub trait SqlxResultExt<T> {
    fn classified(self, decoder: &dyn ErrorDecoder) -> Result<T, DataError>;
}

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn classified(self, decoder: &dyn ErrorDecoder) -> Result<T, DataError> {
        self.map_err(|e| classify(decoder, e))
    }
}

/// Convenience alias for data-layer results using `DataError`.
pub type SqlxResult<T> = Result<T, DataError>;
