//! Like-count rankings.
//!
//! Every ranking runs in two phases: one aggregate query yields the ordered
//! film ids, then [`films::fetch_ranked`] loads and hydrates exactly those ids
//! without touching the order.

use sea_orm::{ConnectionTrait, FromQueryResult, Statement, Value};
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    films,
    models::{DirectorSort, Film, FilmId, UserId},
    references, users,
};

#[derive(Debug, FromQueryResult)]
struct RankedFilm {
    id: FilmId,
    likes: i64,
}

/// Runs a ranking query selecting `id` and `likes` and returns the ids in
/// result order.
pub(crate) async fn ranked_ids<C: ConnectionTrait>(
    db: &C,
    sql: String,
    values: Vec<Value>,
) -> AppResult<Vec<FilmId>> {
    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    let rows = RankedFilm::find_by_statement(stmt).all(db).await?;

    debug!(
        ranked = rows.len(),
        top_likes = rows.first().map(|r| r.likes).unwrap_or_default(),
        "ranked films"
    );

    Ok(rows.into_iter().map(|r| r.id).collect())
}

/// Most-liked films, ties broken by ascending id. Both filters are optional
/// and combine as an intersection. A non-positive `limit` yields nothing.
pub async fn popular<C: ConnectionTrait>(
    db: &C,
    limit: i64,
    genre_id: Option<i32>,
    year: Option<i16>,
) -> AppResult<Vec<Film>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let mut conditions: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(genre_id) = genre_id {
        conditions.push("f.id IN (SELECT fg.film_id FROM film_genres fg WHERE fg.genre_id = ?)");
        values.push(genre_id.into());
    }
    if let Some(year) = year {
        let (first, last) = year_bounds(year)?;
        conditions.push("f.release_date >= ? AND f.release_date <= ?");
        values.push(first.into());
        values.push(last.into());
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT f.id AS id, COUNT(DISTINCT fl.user_id) AS likes \
         FROM films f \
         LEFT JOIN film_likes fl ON fl.film_id = f.id \
         {where_clause} \
         GROUP BY f.id \
         ORDER BY likes DESC, f.id ASC \
         LIMIT ?"
    );
    values.push(limit.into());

    debug!(limit, ?genre_id, ?year, "ranking popular films");
    let ids = ranked_ids(db, sql, values).await?;
    films::fetch_ranked(db, &ids).await
}

/// Films liked by both users, most-liked overall first. Symmetric in its
/// arguments.
pub async fn common<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    friend_id: UserId,
) -> AppResult<Vec<Film>> {
    users::ensure_user(db, user_id).await?;
    users::ensure_user(db, friend_id).await?;

    let sql = "SELECT f.id AS id, COUNT(DISTINCT fl.user_id) AS likes \
               FROM films f \
               JOIN film_likes fl ON fl.film_id = f.id \
               WHERE f.id IN (SELECT film_id FROM film_likes WHERE user_id = ?) \
                 AND f.id IN (SELECT film_id FROM film_likes WHERE user_id = ?) \
               GROUP BY f.id \
               ORDER BY likes DESC, f.id ASC"
        .to_string();

    debug!(user_id, friend_id, "ranking common films");
    let ids = ranked_ids(db, sql, vec![user_id.into(), friend_id.into()]).await?;
    films::fetch_ranked(db, &ids).await
}

/// A director's films, oldest first or most-liked first.
pub async fn by_director<C: ConnectionTrait>(
    db: &C,
    director_id: i32,
    sort: DirectorSort,
) -> AppResult<Vec<Film>> {
    references::ensure_director(db, director_id).await?;

    let order = match sort {
        DirectorSort::Year => "f.release_date ASC, f.id ASC",
        DirectorSort::Likes => "likes DESC, f.id ASC",
    };
    let sql = format!(
        "SELECT f.id AS id, COUNT(DISTINCT fl.user_id) AS likes \
         FROM films f \
         JOIN film_directors fd ON fd.film_id = f.id AND fd.director_id = ? \
         LEFT JOIN film_likes fl ON fl.film_id = f.id \
         GROUP BY f.id \
         ORDER BY {order}"
    );

    debug!(director_id, ?sort, "ranking director films");
    let ids = ranked_ids(db, sql, vec![director_id.into()]).await?;
    films::fetch_ranked(db, &ids).await
}

/// First and last ISO date of a calendar year, both inclusive. Stored dates
/// only compare lexically as four-digit years, hence the range check.
fn year_bounds(year: i16) -> AppResult<(String, String)> {
    if !(1..=9999).contains(&year) {
        return Err(AppError::Validation(format!("year must be between 1 and 9999, got {year}")));
    }
    Ok((format!("{year:04}-01-01"), format!("{year:04}-12-31")))
}
