//! Generic CRUD operations over any [`Entity`].
//!
//! Every function takes the handle explicitly. Writes run the handle's
//! callback chain first, so a failing validation never reaches storage, and
//! every driver error is classified before it is returned.
//!
//! Predicates are partially populated entities: the identifier (when
//! non-zero) and every non-zero column become equality conditions. `None`
//! matches all rows. Conditions an entity cannot express go through
//! [`find`], [`find_one`] and [`count_where`] with a [`QueryBuilder`] from
//! [`query`].

use chrono::Utc;
use ormkit_data::{
    DataError, Dialect, Entity, ListOptions, ListResult, Operation, QueryBuilder, Value,
};
use sqlx::FromRow;

use crate::backend::Backend;
use crate::error::SqlxResultExt;
use crate::handle::Handle;

/// Rows per INSERT statement in [`create_in_batches`].
pub const BATCH_SIZE: usize = 100;

/// An empty query over `T`'s table in the backend's dialect.
///
/// ```ignore
/// let popular = ops::query::<Post, Sqlite>().where_gt("views", 100i64);
/// let n = ops::count_where(&handle, popular).await?;
/// ```
pub fn query<T: Entity, DB: Backend>() -> QueryBuilder {
    QueryBuilder::new(T::table_name(), Dialect::from(DB::KIND))
}

fn conditions<T: Entity>(predicate: Option<&T>) -> Vec<(&'static str, Value)> {
    predicate.map(T::predicate).unwrap_or_default()
}

/// Insert the entity when its identifier is `0`, update it otherwise.
///
/// An update that matches no row falls back to an insert with the given
/// identifier. The returned entity carries the generated identifier.
pub async fn save<T, DB>(handle: &Handle<DB>, mut entity: T) -> Result<T, DataError>
where
    T: Entity,
    DB: Backend,
{
    if entity.id() == 0 {
        handle
            .callbacks()
            .run(Operation::Create, T::table_name(), &entity)?;
        entity.stamp(Operation::Create, Utc::now());
        let ids = insert_rows::<T, DB>(handle, vec![entity.values()]).await?;
        if let Some(id) = ids.first() {
            entity.set_id(*id);
        }
        return Ok(entity);
    }

    handle
        .callbacks()
        .run(Operation::Update, T::table_name(), &entity)?;
    entity.stamp(Operation::Update, Utc::now());
    let (sql, params) = query::<T, DB>()
        .where_eq(T::id_column(), entity.id())
        .build_update(T::columns(), entity.values())?;
    let updated = DB::execute(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())?;
    tracing::debug!(table = T::table_name(), id = entity.id(), updated, "Update");

    // MySQL reports unchanged rows as not affected, so check before inserting.
    if updated == 0 && !exists::<T, DB>(handle, entity.id()).await? {
        let mut columns = vec![T::id_column()];
        columns.extend_from_slice(T::columns());
        let mut values = vec![Value::from(entity.id())];
        values.extend(entity.values());
        let (sql, params) = query::<T, DB>().build_insert(&columns, vec![values], None)?;
        DB::execute(handle.pool(), &sql, params)
            .await
            .classified(handle.decoder())?;
        tracing::debug!(table = T::table_name(), id = entity.id(), "Insert with explicit id");
    }
    Ok(entity)
}

/// Insert `entities` in statements of at most [`BATCH_SIZE`] rows.
///
/// All entities pass the create callbacks before anything is written. The
/// batches are not atomic: a failure leaves earlier batches stored.
pub async fn create_in_batches<T, DB>(
    handle: &Handle<DB>,
    mut entities: Vec<T>,
) -> Result<Vec<T>, DataError>
where
    T: Entity,
    DB: Backend,
{
    let now = Utc::now();
    for entity in entities.iter_mut() {
        handle
            .callbacks()
            .run(Operation::Create, T::table_name(), &*entity)?;
        entity.stamp(Operation::Create, now);
    }

    for batch in entities.chunks_mut(BATCH_SIZE) {
        let rows = batch.iter().map(T::values).collect();
        let ids = insert_rows::<T, DB>(handle, rows).await?;
        for (entity, id) in batch.iter_mut().zip(ids) {
            entity.set_id(id);
        }
    }
    Ok(entities)
}

/// Delete the matching rows in one statement and return how many went.
pub async fn delete<T, DB>(handle: &Handle<DB>, predicate: Option<&T>) -> Result<u64, DataError>
where
    T: Entity,
    DB: Backend,
{
    let filter = conditions(predicate);
    if filter.is_empty() {
        tracing::warn!(table = T::table_name(), "Deleting every row of the table");
    }
    let (sql, params) = query::<T, DB>().filter(filter).build_delete()?;
    let deleted = DB::execute(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())?;
    tracing::debug!(table = T::table_name(), deleted, "Delete");
    Ok(deleted)
}

/// One page of matching rows.
///
/// With `options.count > 0` and no bound, the scan is pinned to the current
/// maximum of the sequence column (`0` for an empty table); pass the returned
/// bound back through [`ListResult::next_options`] to keep later pages on
/// the same snapshot. Pages without an explicit order are read in sequence
/// order.
pub async fn list<T, DB>(
    handle: &Handle<DB>,
    predicate: Option<&T>,
    options: ListOptions,
) -> Result<ListResult<T>, DataError>
where
    T: Entity + for<'r> FromRow<'r, DB::Row>,
    DB: Backend,
{
    let mut max_row_id = options.max_row_id;
    if options.count > 0 && max_row_id.is_none() {
        max_row_id = Some(max_sequence::<T, DB>(handle).await?.unwrap_or(0));
    }

    let mut select = query::<T, DB>();
    if let Some(max) = max_row_id {
        select = select.where_lte(T::sequence_column(), max);
    }
    select = select.filter(conditions(predicate));
    match options.order.as_deref().map(str::trim) {
        Some(order) if !order.is_empty() => select = select.order_expr(order)?,
        _ if options.count > 0 => select = select.order_by(T::sequence_column(), true),
        _ => {}
    }
    if options.count > 0 {
        select = select.limit(options.count);
    }
    if options.offset > 0 {
        select = select.offset(options.offset);
    }

    let (sql, params) = select.build_select(&["*"])?;
    let items = DB::fetch_all::<T>(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())?;
    tracing::debug!(
        table = T::table_name(),
        rows = items.len(),
        max_row_id,
        offset = options.offset,
        "List"
    );
    Ok(ListResult::new(items, max_row_id, options.offset))
}

/// The single row matching `predicate`.
///
/// Fails with `NotFound` when nothing matches and `MultipleResults` when
/// more than one row does.
pub async fn get<T, DB>(handle: &Handle<DB>, predicate: &T) -> Result<T, DataError>
where
    T: Entity + for<'r> FromRow<'r, DB::Row>,
    DB: Backend,
{
    find_one(handle, query::<T, DB>().filter(predicate.predicate())).await
}

/// Number of rows matching `predicate`.
pub async fn count<T, DB>(handle: &Handle<DB>, predicate: Option<&T>) -> Result<u64, DataError>
where
    T: Entity,
    DB: Backend,
{
    count_where(handle, query::<T, DB>().filter(conditions(predicate))).await
}

/// Every row selected by `select`, a query over `T`'s table.
pub async fn find<T, DB>(handle: &Handle<DB>, select: QueryBuilder) -> Result<Vec<T>, DataError>
where
    T: Entity + for<'r> FromRow<'r, DB::Row>,
    DB: Backend,
{
    let (sql, params) = select.build_select(&["*"])?;
    let items = DB::fetch_all::<T>(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())?;
    tracing::debug!(table = T::table_name(), rows = items.len(), "Find");
    Ok(items)
}

/// The single row selected by `select`, with the cardinality checks of [`get`].
pub async fn find_one<T, DB>(handle: &Handle<DB>, select: QueryBuilder) -> Result<T, DataError>
where
    T: Entity + for<'r> FromRow<'r, DB::Row>,
    DB: Backend,
{
    let mut items = find::<T, DB>(handle, select).await?;
    match items.len() {
        0 => Err(DataError::NotFound(format!(
            "no row of {} matches",
            T::table_name()
        ))),
        1 => Ok(items.remove(0)),
        found => Err(DataError::MultipleResults {
            table: T::table_name().to_string(),
            found,
        }),
    }
}

/// Number of rows selected by `select`. Order, limit and offset are ignored.
pub async fn count_where<DB: Backend>(
    handle: &Handle<DB>,
    select: QueryBuilder,
) -> Result<u64, DataError> {
    let (sql, params) = select.build_count()?;
    let count = DB::fetch_i64(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())?;
    Ok(count.map_or(0, |n| n.max(0) as u64))
}

async fn exists<T, DB>(handle: &Handle<DB>, id: i64) -> Result<bool, DataError>
where
    T: Entity,
    DB: Backend,
{
    let (sql, params) = query::<T, DB>().where_eq(T::id_column(), id).build_count()?;
    let count = DB::fetch_i64(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())?;
    Ok(count.unwrap_or(0) > 0)
}

async fn max_sequence<T, DB>(handle: &Handle<DB>) -> Result<Option<i64>, DataError>
where
    T: Entity,
    DB: Backend,
{
    let (sql, params) = query::<T, DB>().build_max(T::sequence_column())?;
    DB::fetch_i64(handle.pool(), &sql, params)
        .await
        .classified(handle.decoder())
}

async fn insert_rows<T, DB>(handle: &Handle<DB>, rows: Vec<Vec<Value>>) -> Result<Vec<i64>, DataError>
where
    T: Entity,
    DB: Backend,
{
    let count = rows.len();
    let returning = handle.returning().then(T::id_column);
    let ids = if count > 1 && !DB::batch_ids(handle.returning()) {
        let statements = rows
            .into_iter()
            .map(|row| query::<T, DB>().build_insert(T::columns(), vec![row], returning))
            .collect::<Result<Vec<_>, _>>()?;
        DB::insert_each(handle.pool(), statements, handle.returning()).await
    } else {
        let (sql, params) = query::<T, DB>().build_insert(T::columns(), rows, returning)?;
        DB::insert(handle.pool(), &sql, params, count, handle.returning()).await
    }
    .classified(handle.decoder())?;
    tracing::debug!(table = T::table_name(), rows = count, "Insert");
    Ok(ids)
}
