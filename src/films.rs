use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::OnConflict,
};
use tracing::{debug, warn};

use crate::{
    associations,
    entities::{film, film_director, film_genre, film_like, mpa_rating},
    error::{AppError, AppResult},
    feed,
    models::{EventType, Film, FilmId, FilmUpdate, IdRef, NewFilm, Operation, UserId, fold_case},
    references, users,
};

/// Loads full films for `ids`, returned in the order of `ids`.
///
/// Ids without a row (deleted since they were ranked) are skipped. Genres and
/// directors are hydrated in bulk.
pub async fn fetch_ranked<C: ConnectionTrait>(db: &C, ids: &[FilmId]) -> AppResult<Vec<Film>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = film::Entity::find()
        .filter(film::Column::Id.is_in(ids.iter().copied()))
        .find_also_related(mpa_rating::Entity)
        .all(db)
        .await?;

    let mut by_id: HashMap<FilmId, Film> = HashMap::with_capacity(rows.len());
    for (row, mpa) in rows {
        by_id.insert(row.id, film_from_row(row, mpa)?);
    }

    let mut films: Vec<Film> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    if films.len() < ids.len() {
        warn!(requested = ids.len(), found = films.len(), "films vanished before hydration");
    }

    associations::hydrate(db, &mut films).await?;
    Ok(films)
}

fn film_from_row(row: film::Model, mpa: Option<mpa_rating::Model>) -> AppResult<Film> {
    Ok(Film {
        id: row.id,
        name: row.name,
        description: row.description,
        release_date: row.release_date.parse()?,
        duration: row.duration,
        mpa: mpa.map(Into::into),
        genres: Vec::new(),
        directors: Vec::new(),
    })
}

pub async fn find_film<C: ConnectionTrait>(db: &C, id: FilmId) -> AppResult<Film> {
    fetch_ranked(db, &[id]).await?.pop().ok_or_else(|| AppError::not_found("film", id))
}

pub async fn ensure_film<C: ConnectionTrait>(db: &C, id: FilmId) -> AppResult<()> {
    let count = film::Entity::find().filter(film::Column::Id.eq(id)).count(db).await?;
    if count == 0 {
        return Err(AppError::not_found("film", id));
    }
    Ok(())
}

pub async fn list_films(db: &DatabaseConnection) -> AppResult<Vec<Film>> {
    let ids: Vec<FilmId> = film::Entity::find()
        .select_only()
        .column(film::Column::Id)
        .order_by_asc(film::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    fetch_ranked(db, &ids).await
}

/// Creates a film with its genre and director links in one transaction.
/// Repeated genre or director ids are collapsed to their first occurrence.
pub async fn create_film(db: &DatabaseConnection, new: NewFilm) -> AppResult<Film> {
    let name = checked_name(&new.name)?;
    let genre_ids = dedup_ids(&new.genres);
    let director_ids = dedup_ids(&new.directors);

    let txn = db.begin().await?;
    ensure_references(&txn, new.mpa, &genre_ids, &director_ids).await?;

    let row = film::ActiveModel {
        id: Default::default(),
        name_folded: Set(fold_case(&name)),
        name: Set(name),
        description: Set(new.description),
        release_date: Set(new.release_date.to_string()),
        duration: Set(new.duration),
        mpa_id: Set(new.mpa.map(|m| m.id)),
    }
    .insert(&txn)
    .await?;

    insert_links(&txn, row.id, &genre_ids, &director_ids).await?;
    txn.commit().await?;

    debug!(film_id = row.id, genres = genre_ids.len(), directors = director_ids.len(), "created film");
    find_film(db, row.id).await
}

/// Replaces every field of a film. The old genre and director links are
/// dropped and the new lists inserted in request order, in one transaction.
pub async fn update_film(db: &DatabaseConnection, update: FilmUpdate) -> AppResult<Film> {
    let FilmUpdate { id, film: new } = update;
    let name = checked_name(&new.name)?;
    let genre_ids = dedup_ids(&new.genres);
    let director_ids = dedup_ids(&new.directors);

    let txn = db.begin().await?;
    ensure_film(&txn, id).await?;
    ensure_references(&txn, new.mpa, &genre_ids, &director_ids).await?;

    film::ActiveModel {
        id: Set(id),
        name_folded: Set(fold_case(&name)),
        name: Set(name),
        description: Set(new.description),
        release_date: Set(new.release_date.to_string()),
        duration: Set(new.duration),
        mpa_id: Set(new.mpa.map(|m| m.id)),
    }
    .update(&txn)
    .await?;

    film_genre::Entity::delete_many()
        .filter(film_genre::Column::FilmId.eq(id))
        .exec(&txn)
        .await?;
    film_director::Entity::delete_many()
        .filter(film_director::Column::FilmId.eq(id))
        .exec(&txn)
        .await?;
    insert_links(&txn, id, &genre_ids, &director_ids).await?;
    txn.commit().await?;

    debug!(film_id = id, genres = genre_ids.len(), directors = director_ids.len(), "updated film");
    find_film(db, id).await
}

fn checked_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("film name must not be blank".to_string()));
    }
    Ok(name.to_string())
}

async fn ensure_references<C: ConnectionTrait>(
    db: &C,
    mpa: Option<IdRef>,
    genre_ids: &[i32],
    director_ids: &[i32],
) -> AppResult<()> {
    if let Some(mpa) = mpa {
        references::ensure_mpa_rating(db, mpa.id).await?;
    }
    references::ensure_genres(db, genre_ids).await?;
    references::ensure_directors(db, director_ids).await
}

/// Link rows get ascending ids in slice order, which is the order they load
/// back in.
async fn insert_links<C: ConnectionTrait>(
    db: &C,
    film_id: FilmId,
    genre_ids: &[i32],
    director_ids: &[i32],
) -> AppResult<()> {
    if !genre_ids.is_empty() {
        film_genre::Entity::insert_many(genre_ids.iter().map(|&genre_id| film_genre::ActiveModel {
            id: Default::default(),
            film_id: Set(film_id),
            genre_id: Set(genre_id),
        }))
        .exec(db)
        .await?;
    }

    if !director_ids.is_empty() {
        film_director::Entity::insert_many(director_ids.iter().map(|&director_id| {
            film_director::ActiveModel {
                id: Default::default(),
                film_id: Set(film_id),
                director_id: Set(director_id),
            }
        }))
        .exec(db)
        .await?;
    }

    Ok(())
}

pub async fn delete_film(db: &DatabaseConnection, id: FilmId) -> AppResult<()> {
    let result = film::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("film", id));
    }
    debug!(film_id = id, "deleted film");
    Ok(())
}

/// A repeated like is a no-op on the relation but is still recorded in the feed.
pub async fn add_like(db: &DatabaseConnection, film_id: FilmId, user_id: UserId) -> AppResult<()> {
    ensure_film(db, film_id).await?;
    users::ensure_user(db, user_id).await?;

    let inserted = film_like::Entity::insert(film_like::ActiveModel {
        id: Default::default(),
        film_id: Set(film_id),
        user_id: Set(user_id),
    })
    .on_conflict(
        OnConflict::columns([film_like::Column::FilmId, film_like::Column::UserId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    debug!(film_id, user_id, inserted, "added like");
    feed::append(db, user_id, EventType::Like, Operation::Add, film_id).await?;
    Ok(())
}

pub async fn remove_like(db: &DatabaseConnection, film_id: FilmId, user_id: UserId) -> AppResult<()> {
    ensure_film(db, film_id).await?;
    users::ensure_user(db, user_id).await?;

    let removed = film_like::Entity::delete_many()
        .filter(film_like::Column::FilmId.eq(film_id))
        .filter(film_like::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    debug!(film_id, user_id, removed = removed.rows_affected, "removed like");
    feed::append(db, user_id, EventType::Like, Operation::Remove, film_id).await?;
    Ok(())
}

fn dedup_ids(refs: &[IdRef]) -> Vec<i32> {
    let mut seen = HashSet::with_capacity(refs.len());
    refs.iter().map(|r| r.id).filter(|id| seen.insert(*id)).collect()
}
