use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use crate::{
    entities::feed_event,
    error::AppResult,
    models::{EventType, FeedEvent, Operation, UserId},
    users,
};

/// Records a mutation in the user's feed, stamped with the current time.
pub async fn append<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    event_type: EventType,
    operation: Operation,
    entity_id: i32,
) -> AppResult<FeedEvent> {
    let now = jiff::Timestamp::now().as_millisecond();
    append_at(db, user_id, now, event_type, operation, entity_id).await
}

pub(crate) async fn append_at<C: ConnectionTrait>(
    db: &C,
    user_id: UserId,
    timestamp: i64,
    event_type: EventType,
    operation: Operation,
    entity_id: i32,
) -> AppResult<FeedEvent> {
    let model = feed_event::ActiveModel {
        id: Default::default(),
        user_id: Set(user_id),
        timestamp: Set(timestamp),
        event_type: Set(event_type.as_code().to_string()),
        operation: Set(operation.as_code().to_string()),
        entity_id: Set(entity_id),
    }
    .insert(db)
    .await?;

    debug!(
        event_id = model.id,
        user_id,
        event_type = event_type.as_code(),
        operation = operation.as_code(),
        entity_id,
        "appended feed event"
    );

    FeedEvent::try_from(model)
}

/// Oldest first. Events sharing a millisecond keep their insertion order.
pub async fn feed(db: &DatabaseConnection, user_id: UserId) -> AppResult<Vec<FeedEvent>> {
    users::ensure_user(db, user_id).await?;

    feed_event::Entity::find()
        .filter(feed_event::Column::UserId.eq(user_id))
        .order_by_asc(feed_event::Column::Timestamp)
        .order_by_asc(feed_event::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(FeedEvent::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, testing};

    #[tokio::test]
    async fn events_are_ordered_by_timestamp_then_event_id() {
        let db = testing::memory_db().await;
        let user = testing::insert_user(&db, "alice").await;

        let first_at_100 =
            append_at(&db, user, 100, EventType::Like, Operation::Add, 10).await.unwrap();
        let second_at_100 =
            append_at(&db, user, 100, EventType::Like, Operation::Remove, 10).await.unwrap();
        let at_50 = append_at(&db, user, 50, EventType::Friend, Operation::Add, 2).await.unwrap();

        let events = feed(&db, user).await.unwrap();

        let order: Vec<i32> = events.iter().map(|e| e.event_id).collect();
        assert_eq!(order, vec![at_50.event_id, first_at_100.event_id, second_at_100.event_id]);
        let stamps: Vec<i64> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![50, 100, 100]);
    }

    #[tokio::test]
    async fn feed_only_contains_the_owners_events() {
        let db = testing::memory_db().await;
        let users = testing::insert_users(&db, 2).await;

        append(&db, users[0], EventType::Review, Operation::Add, 1).await.unwrap();
        append(&db, users[1], EventType::Review, Operation::Update, 1).await.unwrap();

        let events = feed(&db, users[0]).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id, users[0]);
        assert_eq!(events[0].operation, Operation::Add);
        assert!(events[0].timestamp > 0);
    }

    #[tokio::test]
    async fn feed_of_unknown_user_is_not_found() {
        let db = testing::memory_db().await;

        let err = feed(&db, 7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
