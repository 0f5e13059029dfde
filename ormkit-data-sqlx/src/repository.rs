use std::future::Future;
use std::marker::PhantomData;

use ormkit_data::{DataError, Entity, ListOptions, ListResult, Repository};
use sqlx::FromRow;

use crate::backend::Backend;
use crate::handle::Handle;
use crate::ops;

/// A generic SQL-based repository implementation.
///
/// Wraps a [`Handle`] for a given entity type and forwards to [`ops`].
///
/// # Example
///
/// ```ignore
/// let repo = SqlxRepository::<Post, Sqlite>::new(handle.clone());
/// let page = repo.list(None, ListOptions::page(20).order("id desc")).await?;
/// ```
pub struct SqlxRepository<T, DB: Backend> {
    handle: Handle<DB>,
    _marker: PhantomData<T>,
}

impl<T, DB: Backend> SqlxRepository<T, DB> {
    pub fn new(handle: Handle<DB>) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// Get the underlying handle reference.
    pub fn handle(&self) -> &Handle<DB> {
        &self.handle
    }
}

impl<T, DB: Backend> Clone for SqlxRepository<T, DB> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, DB> Repository<T> for SqlxRepository<T, DB>
where
    T: Entity + for<'r> FromRow<'r, DB::Row>,
    DB: Backend,
{
    fn save(&self, entity: T) -> impl Future<Output = Result<T, DataError>> + Send {
        ops::save(&self.handle, entity)
    }

    fn create_in_batches(
        &self,
        entities: Vec<T>,
    ) -> impl Future<Output = Result<Vec<T>, DataError>> + Send {
        ops::create_in_batches(&self.handle, entities)
    }

    fn delete(&self, predicate: Option<&T>) -> impl Future<Output = Result<u64, DataError>> + Send {
        ops::delete(&self.handle, predicate)
    }

    fn list(
        &self,
        predicate: Option<&T>,
        options: ListOptions,
    ) -> impl Future<Output = Result<ListResult<T>, DataError>> + Send {
        ops::list(&self.handle, predicate, options)
    }

    fn get(&self, predicate: &T) -> impl Future<Output = Result<T, DataError>> + Send {
        ops::get(&self.handle, predicate)
    }

    fn count(&self, predicate: Option<&T>) -> impl Future<Output = Result<u64, DataError>> + Send {
        ops::count(&self.handle, predicate)
    }
}
