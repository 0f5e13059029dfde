use crate::entity::Entity;
use crate::error::DataError;
use crate::list::{ListOptions, ListResult};
use std::future::Future;

/// Generic async repository over one entity type.
///
/// Predicates are partially populated entities: every non-zero field is an
/// equality condition, and `None` (or an entity with only zero fields)
/// matches every row.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait Repository<T>: Send + Sync
where
    T: Entity,
{
    /// Insert when the identifier is `0`, otherwise update (or insert with
    /// the explicit identifier if no such row exists).
    fn save(&self, entity: T) -> impl Future<Output = Result<T, DataError>> + Send;

    /// Insert many entities in fixed-size multi-row batches. Not atomic.
    fn create_in_batches(
        &self,
        entities: Vec<T>,
    ) -> impl Future<Output = Result<Vec<T>, DataError>> + Send;

    /// Delete the matching rows and return how many were removed.
    fn delete(&self, predicate: Option<&T>) -> impl Future<Output = Result<u64, DataError>> + Send;

    fn list(
        &self,
        predicate: Option<&T>,
        options: ListOptions,
    ) -> impl Future<Output = Result<ListResult<T>, DataError>> + Send;

    /// The single matching row: `NotFound` for none, `MultipleResults` for more.
    fn get(&self, predicate: &T) -> impl Future<Output = Result<T, DataError>> + Send;

    fn count(&self, predicate: Option<&T>) -> impl Future<Output = Result<u64, DataError>> + Send;
}
