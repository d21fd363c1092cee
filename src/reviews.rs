//! Film reviews and their usefulness score.
//!
//! `useful` is never written directly: it moves only through [`rate`] and
//! [`unrate`], inside the same transaction as the rating row it reflects.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use tracing::debug;

use crate::{
    entities::{review, review_rating},
    error::{AppError, AppResult},
    feed, films,
    models::{EventType, FilmId, NewReview, Operation, Review, ReviewUpdate, UserId},
    users,
};

pub async fn create_review(db: &DatabaseConnection, new: NewReview) -> AppResult<Review> {
    let content = checked_content(&new.content)?;
    users::ensure_user(db, new.user_id).await?;
    films::ensure_film(db, new.film_id).await?;

    let model = review::ActiveModel {
        id: Default::default(),
        content: Set(content),
        is_positive: Set(new.is_positive),
        user_id: Set(new.user_id),
        film_id: Set(new.film_id),
        useful: Set(0),
    }
    .insert(db)
    .await?;

    debug!(review_id = model.id, user_id = model.user_id, film_id = model.film_id, "created review");
    feed::append(db, model.user_id, EventType::Review, Operation::Add, model.id).await?;
    Ok(model.into())
}

/// Only content and polarity change. The feed event goes to the stored author,
/// whatever the caller claims.
pub async fn update_review(db: &DatabaseConnection, update: ReviewUpdate) -> AppResult<Review> {
    let content = checked_content(&update.content)?;
    let existing = find_model(db, update.review_id).await?;
    let author = existing.user_id;

    let mut active: review::ActiveModel = existing.into();
    active.content = Set(content);
    active.is_positive = Set(update.is_positive);
    let model = active.update(db).await?;

    debug!(review_id = model.id, "updated review");
    feed::append(db, author, EventType::Review, Operation::Update, model.id).await?;
    Ok(model.into())
}

pub async fn delete_review(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    let existing = find_model(db, id).await?;
    review::Entity::delete_by_id(id).exec(db).await?;

    debug!(review_id = id, "deleted review");
    feed::append(db, existing.user_id, EventType::Review, Operation::Remove, id).await?;
    Ok(())
}

pub async fn find_review(db: &DatabaseConnection, id: i32) -> AppResult<Review> {
    find_model(db, id).await.map(Into::into)
}

/// Most useful first, ties by ascending id. Without a film, all reviews.
pub async fn list_reviews(
    db: &DatabaseConnection,
    film_id: Option<FilmId>,
    count: u64,
) -> AppResult<Vec<Review>> {
    let mut query = review::Entity::find();
    if let Some(film_id) = film_id {
        query = query.filter(review::Column::FilmId.eq(film_id));
    }

    let rows = query
        .order_by_desc(review::Column::Useful)
        .order_by_asc(review::Column::Id)
        .limit(count)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Records `user_id`'s verdict on a review. A first verdict moves the score by
/// one, a reversed verdict by two, a repeated verdict not at all.
pub async fn rate(
    db: &DatabaseConnection,
    review_id: i32,
    user_id: UserId,
    is_useful: bool,
) -> AppResult<Review> {
    users::ensure_user(db, user_id).await?;
    find_model(db, review_id).await?;

    let txn = db.begin().await?;

    let previous = review_rating::Entity::find()
        .filter(review_rating::Column::ReviewId.eq(review_id))
        .filter(review_rating::Column::UserId.eq(user_id))
        .one(&txn)
        .await?;

    let step = if is_useful { 1 } else { -1 };
    let delta = match previous {
        None => {
            review_rating::ActiveModel {
                id: Default::default(),
                review_id: Set(review_id),
                user_id: Set(user_id),
                is_useful: Set(is_useful),
            }
            .insert(&txn)
            .await?;
            step
        },
        Some(prev) if prev.is_useful != is_useful => {
            let mut active: review_rating::ActiveModel = prev.into();
            active.is_useful = Set(is_useful);
            active.update(&txn).await?;
            2 * step
        },
        Some(_) => 0,
    };

    if delta != 0 {
        shift_useful(&txn, review_id, delta).await?;
    }
    txn.commit().await?;

    debug!(review_id, user_id, is_useful, delta, "rated review");
    find_review(db, review_id).await
}

/// Withdraws a verdict of the given polarity. A missing or opposite verdict
/// leaves the score alone.
pub async fn unrate(
    db: &DatabaseConnection,
    review_id: i32,
    user_id: UserId,
    is_useful: bool,
) -> AppResult<Review> {
    users::ensure_user(db, user_id).await?;
    find_model(db, review_id).await?;

    let txn = db.begin().await?;

    let removed = review_rating::Entity::delete_many()
        .filter(review_rating::Column::ReviewId.eq(review_id))
        .filter(review_rating::Column::UserId.eq(user_id))
        .filter(review_rating::Column::IsUseful.eq(is_useful))
        .exec(&txn)
        .await?;

    if removed.rows_affected > 0 {
        shift_useful(&txn, review_id, if is_useful { -1 } else { 1 }).await?;
    }
    txn.commit().await?;

    debug!(review_id, user_id, is_useful, removed = removed.rows_affected, "withdrew review rating");
    find_review(db, review_id).await
}

async fn shift_useful<C: ConnectionTrait>(db: &C, review_id: i32, delta: i64) -> AppResult<()> {
    review::Entity::update_many()
        .col_expr(review::Column::Useful, Expr::col(review::Column::Useful).add(delta))
        .filter(review::Column::Id.eq(review_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn find_model<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<review::Model> {
    review::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("review", id))
}

fn checked_content(content: &str) -> AppResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("review content must not be blank".to_string()));
    }
    Ok(content.to_string())
}
