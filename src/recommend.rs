//! Single-neighbor collaborative filtering.
//!
//! The neighbor is the one other user whose likes overlap the target's the
//! most; the recommendation is whatever that neighbor liked and the target
//! has not. No blending across several neighbors.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{ConnectionTrait, EntityTrait, QuerySelect};
use tracing::debug;

use crate::{
    entities::film_like,
    error::AppResult,
    films,
    models::{Film, FilmId, UserId},
    users,
};

pub type LikesByUser = BTreeMap<UserId, BTreeSet<FilmId>>;

pub async fn recommend<C: ConnectionTrait>(db: &C, user_id: UserId) -> AppResult<Vec<Film>> {
    users::ensure_user(db, user_id).await?;

    let likes = likes_by_user(db).await?;
    let recommended = recommended_ids(user_id, &likes);

    debug!(
        user_id,
        users_with_likes = likes.len(),
        recommended = recommended.len(),
        "computed recommendations"
    );

    films::fetch_ranked(db, &recommended).await
}

/// Every like in the store, in one read.
async fn likes_by_user<C: ConnectionTrait>(db: &C) -> AppResult<LikesByUser> {
    let rows: Vec<(UserId, FilmId)> = film_like::Entity::find()
        .select_only()
        .column(film_like::Column::UserId)
        .column(film_like::Column::FilmId)
        .into_tuple()
        .all(db)
        .await?;

    let mut likes = LikesByUser::new();
    for (user_id, film_id) in rows {
        likes.entry(user_id).or_default().insert(film_id);
    }
    Ok(likes)
}

/// The other user with the largest non-zero overlap. Among equal overlaps the
/// lowest user id wins.
pub fn nearest_neighbor(target: UserId, likes: &LikesByUser) -> Option<UserId> {
    let target_likes = likes.get(&target)?;

    let mut best: Option<(UserId, usize)> = None;
    for (&candidate, candidate_likes) in likes {
        if candidate == target {
            continue;
        }
        let overlap = target_likes.intersection(candidate_likes).count();
        if overlap > best.map_or(0, |(_, n)| n) {
            best = Some((candidate, overlap));
        }
    }

    best.map(|(user_id, _)| user_id)
}

/// Neighbor's likes minus the target's, ascending by film id.
pub fn recommended_ids(target: UserId, likes: &LikesByUser) -> Vec<FilmId> {
    let Some(neighbor) = nearest_neighbor(target, likes) else {
        return Vec::new();
    };

    let empty = BTreeSet::new();
    let target_likes = likes.get(&target).unwrap_or(&empty);
    likes[&neighbor].difference(target_likes).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, testing};

    fn likes(rows: &[(UserId, Vec<FilmId>)]) -> LikesByUser {
        rows.iter().map(|(user, films)| (*user, films.iter().copied().collect())).collect()
    }

    #[test]
    fn neighbor_needs_a_nonzero_overlap() {
        let likes = likes(&[(1, vec![10]), (2, vec![20])]);

        assert_eq!(nearest_neighbor(1, &likes), None);
        assert_eq!(nearest_neighbor(3, &likes), None);
        assert!(recommended_ids(1, &likes).is_empty());
    }

    #[test]
    fn largest_overlap_wins_and_ties_go_to_the_lowest_id() {
        let likes = likes(&[
            (1, vec![10, 20, 30]),
            (2, vec![10, 40]),
            (3, vec![10, 20, 50]),
            (4, vec![20, 30, 60]),
        ]);

        // users 3 and 4 both overlap user 1 on two films.
        assert_eq!(nearest_neighbor(1, &likes), Some(3));
        assert_eq!(recommended_ids(1, &likes), vec![50]);
    }

    #[test]
    fn only_the_single_best_neighbor_contributes() {
        let likes = likes(&[(1, vec![10, 20]), (2, vec![10, 20, 30]), (3, vec![10, 40])]);

        assert_eq!(recommended_ids(1, &likes), vec![30]);
    }

    #[test]
    fn neighbor_with_nothing_new_yields_nothing() {
        let likes = likes(&[(1, vec![10, 20]), (2, vec![10])]);

        assert_eq!(nearest_neighbor(1, &likes), Some(2));
        assert!(recommended_ids(1, &likes).is_empty());
    }

    #[tokio::test]
    async fn recommends_what_the_closest_user_liked() {
        let db = testing::memory_db().await;
        let users = testing::insert_users(&db, 3).await;
        let f10 = testing::insert_film(&db, "Film 10", "2001-01-01").await;
        let f20 = testing::insert_film(&db, "Film 20", "2002-01-01").await;
        let f30 = testing::insert_film(&db, "Film 30", "2003-01-01").await;
        testing::like(&db, f10, &[users[0]]).await;
        testing::like(&db, f20, &[users[0], users[1]]).await;
        testing::like(&db, f30, &[users[1]]).await;

        let for_u1 = recommend(&db, users[0]).await.unwrap();
        let for_u2 = recommend(&db, users[1]).await.unwrap();
        let for_u3 = recommend(&db, users[2]).await.unwrap();

        // Single-neighbor rule: each of U1 and U2 is the other's only overlap.
        assert_eq!(for_u1.iter().map(|f| f.id).collect::<Vec<_>>(), vec![f30]);
        assert_eq!(for_u2.iter().map(|f| f.id).collect::<Vec<_>>(), vec![f10]);
        assert!(for_u3.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let db = testing::memory_db().await;

        let err = recommend(&db, 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
