//! Typed CRUD helpers shared by every resource.
//!
//! Handlers own their transactions and pass either the pool or a
//! `DatabaseTransaction` as `db`. Relations are never loaded implicitly: a
//! handler asks for exactly the related rows it renders, through
//! [`load_by_ids`] or `find_also_related`.

use std::collections::{BTreeSet, HashMap};

use sea_orm::*;

use crate::error::AppError;

/// Persist a new row and return it with generated id and defaults.
pub async fn create<C, A>(db: &C, model: A) -> Result<<A::Entity as EntityTrait>::Model, AppError>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    Ok(model.insert(db).await?)
}

/// Overwrite a row with the values carried by `model`.
pub async fn update<C, A>(db: &C, model: A) -> Result<<A::Entity as EntityTrait>::Model, AppError>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    Ok(model.update(db).await?)
}

/// Look up a row by id; `what` names the entity in the 404 message.
pub async fn find_by_id<E, C>(db: &C, id: i32, what: &str) -> Result<E::Model, AppError>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{what} not found")))
}

/// Fail with 404 unless a row with `id` exists.
pub async fn ensure_exists<E, C>(db: &C, id: i32, what: &str) -> Result<(), AppError>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    find_by_id::<E, C>(db, id, what).await.map(|_| ())
}

/// Delete a row by id, failing with 404 if nothing was removed.
pub async fn delete_by_id<E, C>(db: &C, id: i32, what: &str) -> Result<(), AppError>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    let result = E::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("{what} not found")));
    }
    Ok(())
}

/// Number of rows matching `condition`.
pub async fn count<E, C>(db: &C, condition: Condition) -> Result<u64, AppError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    Ok(E::find().filter(condition).count(db).await?)
}

/// Fetch the rows whose `column` is in `ids`, keyed by `key`.
///
/// Used to preload one relation for a batch of parent rows in a single query.
pub async fn load_by_ids<E, C, K>(
    db: &C,
    column: E::Column,
    ids: impl IntoIterator<Item = i32>,
    key: K,
) -> Result<HashMap<i32, E::Model>, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    K: Fn(&E::Model) -> i32,
{
    let ids: BTreeSet<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = E::find().filter(column.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|row| (key(&row), row)).collect())
}

/// Every id in `wanted` that has no matching row, for "does not exist" errors.
pub async fn missing_ids<E, C>(
    db: &C,
    column: E::Column,
    wanted: &[i32],
    key: fn(&E::Model) -> i32,
) -> Result<Vec<i32>, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let found = load_by_ids::<E, C, _>(db, column, wanted.iter().copied(), key).await?;
    let mut missing: Vec<i32> = wanted
        .iter()
        .copied()
        .filter(|id| !found.contains_key(id))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    Ok(missing)
}
