use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::{director, genre, mpa_rating},
    error::{AppError, AppResult},
    models::{Director, Genre, MpaRating, NewDirector, fold_case},
};

pub async fn list_genres(db: &DatabaseConnection) -> AppResult<Vec<Genre>> {
    let rows = genre::Entity::find().order_by_asc(genre::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(Genre::from).collect())
}

pub async fn list_mpa_ratings(db: &DatabaseConnection) -> AppResult<Vec<MpaRating>> {
    let rows = mpa_rating::Entity::find().order_by_asc(mpa_rating::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(MpaRating::from).collect())
}

pub async fn list_directors(db: &DatabaseConnection) -> AppResult<Vec<Director>> {
    let rows = director::Entity::find().order_by_asc(director::Column::Id).all(db).await?;
    Ok(rows.into_iter().map(Director::from).collect())
}

pub async fn find_genre(db: &DatabaseConnection, id: i32) -> AppResult<Genre> {
    let model = genre::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("genre", id))?;
    Ok(model.into())
}

pub async fn find_mpa_rating(db: &DatabaseConnection, id: i32) -> AppResult<MpaRating> {
    let model = mpa_rating::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("MPA rating", id))?;
    Ok(model.into())
}

pub async fn find_director(db: &DatabaseConnection, id: i32) -> AppResult<Director> {
    let model = director::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("director", id))?;
    Ok(model.into())
}

pub async fn create_director(db: &DatabaseConnection, new: NewDirector) -> AppResult<Director> {
    let name = checked_director_name(&new.name)?;

    let model = director::ActiveModel {
        id: Default::default(),
        name_folded: Set(fold_case(&name)),
        name: Set(name),
    }
    .insert(db)
    .await?;
    Ok(model.into())
}

/// Renames a director. The folded search key is rewritten with the name.
pub async fn update_director(db: &DatabaseConnection, update: Director) -> AppResult<Director> {
    let name = checked_director_name(&update.name)?;
    ensure_director(db, update.id).await?;

    let model = director::ActiveModel {
        id: Set(update.id),
        name_folded: Set(fold_case(&name)),
        name: Set(name),
    }
    .update(db)
    .await?;
    Ok(model.into())
}

/// Film links to the director cascade away; the films stay.
pub async fn delete_director(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    let result = director::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("director", id));
    }
    Ok(())
}

fn checked_director_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("director name must not be blank".to_string()));
    }
    Ok(name.to_string())
}

pub async fn ensure_director<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    ensure_all_exist::<director::Entity, _>(db, "director", director::Column::Id, &[id]).await
}

pub async fn ensure_mpa_rating<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<()> {
    ensure_all_exist::<mpa_rating::Entity, _>(db, "MPA rating", mpa_rating::Column::Id, &[id]).await
}

pub async fn ensure_genres<C: ConnectionTrait>(db: &C, ids: &[i32]) -> AppResult<()> {
    ensure_all_exist::<genre::Entity, _>(db, "genre", genre::Column::Id, ids).await
}

pub async fn ensure_directors<C: ConnectionTrait>(db: &C, ids: &[i32]) -> AppResult<()> {
    ensure_all_exist::<director::Entity, _>(db, "director", director::Column::Id, ids).await
}

/// One `IN` query for the whole id list; reports the first id that is missing.
async fn ensure_all_exist<E, C>(db: &C, what: &str, column: E::Column, ids: &[i32]) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(());
    }

    let found: BTreeSet<i32> = E::find()
        .select_only()
        .column(column)
        .filter(column.is_in(ids.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    match ids.iter().find(|id| !found.contains(*id)) {
        Some(&missing) => Err(AppError::not_found(what, missing)),
        None => Ok(()),
    }
}
