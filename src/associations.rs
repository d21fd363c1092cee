//! Bulk loading of a film's many-to-many associations.
//!
//! Each loader issues a single query for the whole id set, so hydrating a
//! page of films costs two queries no matter how many films it holds.

use std::collections::{BTreeSet, HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use crate::{
    entities::{director, film_director, film_genre, genre},
    error::AppResult,
    models::{Director, Film, FilmId, Genre},
};

pub async fn load_genres<C: ConnectionTrait>(
    db: &C,
    film_ids: &BTreeSet<FilmId>,
) -> AppResult<HashMap<FilmId, Vec<Genre>>> {
    if film_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = film_genre::Entity::find()
        .filter(film_genre::Column::FilmId.is_in(film_ids.iter().copied()))
        .order_by_asc(film_genre::Column::Id)
        .find_also_related(genre::Entity)
        .all(db)
        .await?;

    debug!(films = film_ids.len(), rows = rows.len(), "loaded film genres");

    Ok(group_first_seen(
        rows.into_iter().filter_map(|(link, g)| g.map(|g| (link.film_id, Genre::from(g)))),
        |g| g.id,
    ))
}

pub async fn load_directors<C: ConnectionTrait>(
    db: &C,
    film_ids: &BTreeSet<FilmId>,
) -> AppResult<HashMap<FilmId, Vec<Director>>> {
    if film_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = film_director::Entity::find()
        .filter(film_director::Column::FilmId.is_in(film_ids.iter().copied()))
        .order_by_asc(film_director::Column::Id)
        .find_also_related(director::Entity)
        .all(db)
        .await?;

    debug!(films = film_ids.len(), rows = rows.len(), "loaded film directors");

    Ok(group_first_seen(
        rows.into_iter().filter_map(|(link, d)| d.map(|d| (link.film_id, Director::from(d)))),
        |d| d.id,
    ))
}

/// Fills `genres` and `directors` on every film in place. Films with no
/// association rows end up with empty lists.
pub async fn hydrate<C: ConnectionTrait>(db: &C, films: &mut [Film]) -> AppResult<()> {
    let ids: BTreeSet<FilmId> = films.iter().map(|f| f.id).collect();
    let mut genres = load_genres(db, &ids).await?;
    let mut directors = load_directors(db, &ids).await?;

    for film in films.iter_mut() {
        film.genres = genres.remove(&film.id).unwrap_or_default();
        film.directors = directors.remove(&film.id).unwrap_or_default();
    }

    Ok(())
}

/// Groups `(film, item)` pairs by film, keeping the first occurrence of each
/// item key in arrival order.
fn group_first_seen<T>(
    rows: impl IntoIterator<Item = (FilmId, T)>,
    key: impl Fn(&T) -> i32,
) -> HashMap<FilmId, Vec<T>> {
    let mut grouped: HashMap<FilmId, Vec<T>> = HashMap::new();
    let mut seen: HashSet<(FilmId, i32)> = HashSet::new();

    for (film_id, item) in rows {
        if seen.insert((film_id, key(&item))) {
            grouped.entry(film_id).or_default().push(item);
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, COMEDY, DRAMA, THRILLER};

    fn genre(id: i32, name: &str) -> Genre {
        Genre { id, name: name.to_string() }
    }

    #[test]
    fn grouping_drops_repeats_and_keeps_first_seen_order() {
        let rows = vec![
            (1, genre(DRAMA, "Drama")),
            (2, genre(THRILLER, "Thriller")),
            (1, genre(COMEDY, "Comedy")),
            (1, genre(DRAMA, "Drama")),
        ];

        let grouped = group_first_seen(rows, |g| g.id);

        assert_eq!(grouped[&1], vec![genre(DRAMA, "Drama"), genre(COMEDY, "Comedy")]);
        assert_eq!(grouped[&2], vec![genre(THRILLER, "Thriller")]);
    }

    #[tokio::test]
    async fn empty_id_set_yields_empty_maps() {
        let db = testing::memory_db().await;

        assert!(load_genres(&db, &BTreeSet::new()).await.unwrap().is_empty());
        assert!(load_directors(&db, &BTreeSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn genres_follow_attachment_order_not_genre_id() {
        let db = testing::memory_db().await;
        let film = testing::insert_film(&db, "Heat", "1995-12-15").await;
        testing::attach_genre(&db, film, THRILLER).await;
        testing::attach_genre(&db, film, DRAMA).await;

        let genres = load_genres(&db, &BTreeSet::from([film])).await.unwrap();

        let ids: Vec<i32> = genres[&film].iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![THRILLER, DRAMA]);
    }

    #[tokio::test]
    async fn loads_many_films_and_leaves_bare_films_out_of_the_map() {
        let db = testing::memory_db().await;
        let films = testing::insert_films(&db, 3).await;
        let nolan = testing::insert_director(&db, "Christopher Nolan").await;
        let mann = testing::insert_director(&db, "Michael Mann").await;
        testing::attach_genre(&db, films[0], COMEDY).await;
        testing::attach_genre(&db, films[1], DRAMA).await;
        testing::attach_director(&db, films[0], nolan).await;
        testing::attach_director(&db, films[0], mann).await;

        let ids: BTreeSet<FilmId> = films.iter().copied().collect();
        let genres = load_genres(&db, &ids).await.unwrap();
        let directors = load_directors(&db, &ids).await.unwrap();

        assert_eq!(genres[&films[0]], vec![genre(COMEDY, "Comedy")]);
        assert_eq!(genres[&films[1]], vec![genre(DRAMA, "Drama")]);
        assert!(!genres.contains_key(&films[2]));

        let names: Vec<&str> = directors[&films[0]].iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Christopher Nolan", "Michael Mann"]);
        assert!(!directors.contains_key(&films[1]));
    }
}
