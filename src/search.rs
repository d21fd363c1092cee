use sea_orm::{ConnectionTrait, Value};
use tracing::debug;

use crate::{
    error::AppResult,
    films,
    models::{Film, SearchScope, fold_case},
    ranking,
};

const TITLE_MATCH: &str = "f.name_folded LIKE ? ESCAPE '\\'";

const DIRECTOR_MATCH: &str = "EXISTS (SELECT 1 FROM film_directors fd \
     JOIN directors d ON d.id = fd.director_id \
     WHERE fd.film_id = f.id AND d.name_folded LIKE ? ESCAPE '\\')";

/// Case-insensitive substring search over titles, director names, or either.
/// Most-liked matches come first.
pub async fn search<C: ConnectionTrait>(
    db: &C,
    query: &str,
    scope: SearchScope,
) -> AppResult<Vec<Film>> {
    let pattern = like_pattern(query);

    let mut predicates: Vec<&str> = Vec::with_capacity(2);
    let mut values: Vec<Value> = Vec::with_capacity(2);
    if scope.matches_title() {
        predicates.push(TITLE_MATCH);
        values.push(pattern.clone().into());
    }
    if scope.matches_director() {
        predicates.push(DIRECTOR_MATCH);
        values.push(pattern.into());
    }

    let sql = format!(
        "SELECT f.id AS id, COUNT(DISTINCT fl.user_id) AS likes \
         FROM films f \
         LEFT JOIN film_likes fl ON fl.film_id = f.id \
         WHERE {} \
         GROUP BY f.id \
         ORDER BY likes DESC, f.id ASC",
        predicates.join(" OR ")
    );

    debug!(query, ?scope, "searching films");
    let ids = ranking::ranked_ids(db, sql, values).await?;
    films::fetch_ranked(db, &ids).await
}

/// Case-folded `%query%` with LIKE metacharacters escaped, so the query is
/// matched literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in fold_case(query.trim()).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::FilmId, testing};

    fn names(films: &[Film]) -> Vec<&str> {
        films.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" NoLaN "), "%nolan%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    async fn seed(db: &sea_orm::DatabaseConnection) -> Vec<FilmId> {
        let users = testing::insert_users(db, 3).await;
        let inception = testing::insert_film(db, "Inception", "2010-07-16").await;
        let jaws = testing::insert_film(db, "Jaws", "1975-06-20").await;
        let random = testing::insert_film(db, "Random Movie", "2020-01-01").await;
        let nolan = testing::insert_director(db, "Christopher Nolan").await;
        let spielberg = testing::insert_director(db, "Steven Spielberg").await;
        testing::attach_director(db, inception, nolan).await;
        testing::attach_director(db, jaws, spielberg).await;
        testing::like(db, inception, &users[..2]).await;
        testing::like(db, jaws, &users[2..]).await;
        vec![inception, jaws, random]
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive_and_ranked_by_likes() {
        let db = testing::memory_db().await;
        seed(&db).await;

        let found = search(&db, "a", SearchScope::Title).await.unwrap();
        assert_eq!(names(&found), vec!["Jaws", "Random Movie"]);

        let found = search(&db, "INCEP", SearchScope::Title).await.unwrap();
        assert_eq!(names(&found), vec!["Inception"]);
        assert_eq!(found[0].directors[0].name, "Christopher Nolan");
    }

    #[tokio::test]
    async fn director_search_matches_director_names_only() {
        let db = testing::memory_db().await;
        seed(&db).await;

        let found = search(&db, "spielberg", SearchScope::Director).await.unwrap();
        assert_eq!(names(&found), vec!["Jaws"]);
        assert!(search(&db, "jaws", SearchScope::Director).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn combined_scope_is_a_union_of_both_predicates() {
        let db = testing::memory_db().await;
        seed(&db).await;

        assert!(search(&db, "nolan", SearchScope::Title).await.unwrap().is_empty());
        let found = search(&db, "NoLaN", SearchScope::Both).await.unwrap();
        assert_eq!(names(&found), vec!["Inception"]);

        let found = search(&db, "n", SearchScope::Both).await.unwrap();
        assert_eq!(names(&found), vec!["Inception", "Jaws", "Random Movie"]);
    }

    #[tokio::test]
    async fn non_ascii_names_match_in_any_case() {
        let db = testing::memory_db().await;
        let interstellar = testing::insert_film(&db, "Интерстеллар", "2014-11-06").await;
        testing::insert_film(&db, "Amélie", "2001-04-25").await;
        let tarkovsky = testing::insert_director(&db, "Андрей Тарковский").await;
        let stalker = testing::insert_film(&db, "Stalker", "1979-05-25").await;
        testing::attach_director(&db, stalker, tarkovsky).await;

        for query in ["Интер", "интер", "ИНТЕР"] {
            let found = search(&db, query, SearchScope::Title).await.unwrap();
            let ids: Vec<FilmId> = found.iter().map(|f| f.id).collect();
            assert_eq!(ids, vec![interstellar], "{query}");
        }
        for query in ["Amélie", "amélie", "AMÉLIE"] {
            let found = search(&db, query, SearchScope::Title).await.unwrap();
            assert_eq!(names(&found), vec!["Amélie"], "{query}");
        }
        for query in ["Тарковский", "тарковский", "ТАРКОВСКИЙ"] {
            let found = search(&db, query, SearchScope::Director).await.unwrap();
            assert_eq!(names(&found), vec!["Stalker"], "{query}");
        }
    }

    #[tokio::test]
    async fn wildcards_in_the_query_are_literal() {
        let db = testing::memory_db().await;
        seed(&db).await;

        assert!(search(&db, "%", SearchScope::Both).await.unwrap().is_empty());
        assert!(search(&db, "_aws", SearchScope::Title).await.unwrap().is_empty());
    }
}
