use crate::callbacks::Operation;
use crate::value::Value;
use chrono::{DateTime, Utc};

/// Trait representing a database entity stored in one table.
///
/// The identifier is assigned by the database (auto-increment); `0` means the
/// record has not been stored yet. Pagination pins pages to the maximum of the
/// [`sequence_column`](Entity::sequence_column), which must be monotonic for
/// inserts. It defaults to the identifier column, so declare
/// `INTEGER PRIMARY KEY AUTOINCREMENT` on SQLite to rule out rowid reuse.
///
/// # Example
///
/// ```ignore
/// impl Entity for Post {
///     fn table_name() -> &'static str { "posts" }
///     fn columns() -> &'static [&'static str] { &["title", "body"] }
///     fn id(&self) -> i64 { self.id }
///     fn set_id(&mut self, id: i64) { self.id = id }
///     fn values(&self) -> Vec<Value> {
///         vec![Value::from(&self.title), Value::from(&self.body)]
///     }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    fn table_name() -> &'static str;

    fn id_column() -> &'static str {
        "id"
    }

    /// Monotonic column used to pin paginated scans.
    fn sequence_column() -> &'static str {
        Self::id_column()
    }

    /// Non-identifier columns, in the same order as [`values`](Entity::values).
    fn columns() -> &'static [&'static str];

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Current values of [`columns`](Entity::columns).
    fn values(&self) -> Vec<Value>;

    /// Field-level validation run by the validation plugin before writes.
    ///
    /// Types deriving `garde::Validate` usually forward to it:
    ///
    /// ```ignore
    /// fn validate_fields(&self) -> Result<(), garde::Report> {
    ///     garde::Validate::validate(self)
    /// }
    /// ```
    fn validate_fields(&self) -> Result<(), garde::Report> {
        Ok(())
    }

    /// Called right before the entity is written, e.g. to maintain
    /// `created_at` / `updated_at` columns.
    fn stamp(&mut self, _operation: Operation, _now: DateTime<Utc>) {}

    /// Column/value pairs of the fields set on this entity, used when the
    /// entity acts as an equality predicate. Zero values are skipped.
    fn predicate(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if self.id() != 0 {
            out.push((Self::id_column(), Value::Int(Some(self.id()))));
        }
        out.extend(
            Self::columns()
                .iter()
                .copied()
                .zip(self.values())
                .filter(|(_, value)| !value.is_zero()),
        );
        out
    }
}
