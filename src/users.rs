use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, sea_query::OnConflict,
};
use tracing::debug;

use crate::{
    entities::{friendship, user},
    error::{AppError, AppResult},
    feed,
    models::{EventType, NewUser, Operation, User, UserId, UserUpdate},
};

pub async fn create_user(db: &DatabaseConnection, new: NewUser) -> AppResult<User> {
    let email = new.email.trim().to_string();
    let (login, name) = login_and_name(&new);

    let model = user::ActiveModel {
        id: Default::default(),
        email: Set(email.clone()),
        login: Set(login),
        name: Set(name),
        birthday: Set(new.birthday.map(|d| d.to_string())),
    }
    .insert(db)
    .await
    .map_err(|err| email_taken(err, &email))?;

    debug!(user_id = model.id, "created user");
    User::try_from(model)
}

pub async fn update_user(db: &DatabaseConnection, update: UserUpdate) -> AppResult<User> {
    let UserUpdate { id, user: new } = update;
    ensure_user(db, id).await?;

    let email = new.email.trim().to_string();
    let (login, name) = login_and_name(&new);

    let model = user::ActiveModel {
        id: Set(id),
        email: Set(email.clone()),
        login: Set(login),
        name: Set(name),
        birthday: Set(new.birthday.map(|d| d.to_string())),
    }
    .update(db)
    .await
    .map_err(|err| email_taken(err, &email))?;

    debug!(user_id = id, "updated user");
    User::try_from(model)
}

/// Likes, friendships and reviews go with the user.
pub async fn delete_user(db: &DatabaseConnection, id: UserId) -> AppResult<()> {
    let result = user::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("user", id));
    }
    debug!(user_id = id, "deleted user");
    Ok(())
}

pub async fn list_users(db: &DatabaseConnection) -> AppResult<Vec<User>> {
    user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

pub async fn find_user(db: &DatabaseConnection, id: UserId) -> AppResult<User> {
    let model = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("user", id))?;
    User::try_from(model)
}

pub async fn ensure_user<C: ConnectionTrait>(db: &C, id: UserId) -> AppResult<()> {
    let count = user::Entity::find().filter(user::Column::Id.eq(id)).count(db).await?;
    if count == 0 {
        return Err(AppError::not_found("user", id));
    }
    Ok(())
}

pub async fn add_friend(db: &DatabaseConnection, user_id: UserId, friend_id: UserId) -> AppResult<()> {
    if user_id == friend_id {
        return Err(AppError::Validation("a user cannot befriend themselves".to_string()));
    }
    ensure_user(db, user_id).await?;
    ensure_user(db, friend_id).await?;

    let inserted = friendship::Entity::insert(friendship::ActiveModel {
        id: Default::default(),
        user_id: Set(user_id),
        friend_id: Set(friend_id),
    })
    .on_conflict(
        OnConflict::columns([friendship::Column::UserId, friendship::Column::FriendId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    debug!(user_id, friend_id, inserted, "added friend");
    feed::append(db, user_id, EventType::Friend, Operation::Add, friend_id).await?;
    Ok(())
}

pub async fn remove_friend(
    db: &DatabaseConnection,
    user_id: UserId,
    friend_id: UserId,
) -> AppResult<()> {
    ensure_user(db, user_id).await?;
    ensure_user(db, friend_id).await?;

    let removed = friendship::Entity::delete_many()
        .filter(friendship::Column::UserId.eq(user_id))
        .filter(friendship::Column::FriendId.eq(friend_id))
        .exec(db)
        .await?;

    debug!(user_id, friend_id, removed = removed.rows_affected, "removed friend");
    feed::append(db, user_id, EventType::Friend, Operation::Remove, friend_id).await?;
    Ok(())
}

pub async fn friends(db: &DatabaseConnection, user_id: UserId) -> AppResult<Vec<User>> {
    ensure_user(db, user_id).await?;
    let friend_ids = friend_ids(db, user_id).await?;
    users_by_id(db, friend_ids).await
}

/// Users both `user_id` and `other_id` have added as friends.
pub async fn common_friends(
    db: &DatabaseConnection,
    user_id: UserId,
    other_id: UserId,
) -> AppResult<Vec<User>> {
    ensure_user(db, user_id).await?;
    ensure_user(db, other_id).await?;

    let mine: BTreeSet<UserId> = friend_ids(db, user_id).await?.into_iter().collect();
    let theirs: BTreeSet<UserId> = friend_ids(db, other_id).await?.into_iter().collect();
    let shared: Vec<UserId> = mine.intersection(&theirs).copied().collect();

    debug!(user_id, other_id, shared = shared.len(), "computed common friends");
    users_by_id(db, shared).await
}

async fn friend_ids(db: &DatabaseConnection, user_id: UserId) -> AppResult<Vec<UserId>> {
    let ids = friendship::Entity::find()
        .select_only()
        .column(friendship::Column::FriendId)
        .filter(friendship::Column::UserId.eq(user_id))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids)
}

async fn users_by_id(db: &DatabaseConnection, ids: Vec<UserId>) -> AppResult<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

/// Trimmed login, and the display name with a blank one falling back to the
/// login.
fn login_and_name(new: &NewUser) -> (String, String) {
    let login = new.login.trim().to_string();
    let name = match new.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => login.clone(),
    };
    (login, name)
}

fn email_taken(err: DbErr, email: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::Validation(format!("email {email} is already registered"))
    } else {
        AppError::from(err)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn new_user(email: &str, login: &str, name: Option<&str>) -> NewUser {
        NewUser {
            email: email.to_string(),
            login: login.to_string(),
            name: name.map(str::to_string),
            birthday: Some("1990-05-17".parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn blank_display_name_falls_back_to_login() {
        let db = testing::memory_db().await;

        let unnamed = create_user(&db, new_user("a@example.com", "alice", None)).await.unwrap();
        let blank = create_user(&db, new_user("b@example.com", "bob", Some("   "))).await.unwrap();
        let named = create_user(&db, new_user("c@example.com", "carol", Some("Carol"))).await.unwrap();

        assert_eq!(unnamed.name, "alice");
        assert_eq!(blank.name, "bob");
        assert_eq!(named.name, "Carol");
        assert_eq!(find_user(&db, named.id).await.unwrap(), named);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = testing::memory_db().await;

        create_user(&db, new_user("a@example.com", "alice", None)).await.unwrap();
        let err = create_user(&db, new_user("a@example.com", "alias", None)).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn friendship_is_one_directional_and_idempotent() {
        let db = testing::memory_db().await;
        let users = testing::insert_users(&db, 2).await;

        add_friend(&db, users[0], users[1]).await.unwrap();
        add_friend(&db, users[0], users[1]).await.unwrap();

        let ids: Vec<UserId> = friends(&db, users[0]).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![users[1]]);
        assert!(friends(&db, users[1]).await.unwrap().is_empty());

        remove_friend(&db, users[0], users[1]).await.unwrap();
        assert!(friends(&db, users[0]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_rewrites_fields_and_keeps_emails_unique() {
        let db = testing::memory_db().await;
        let alice =
            create_user(&db, new_user("a@example.com", "alice", Some("Alice"))).await.unwrap();
        create_user(&db, new_user("b@example.com", "bob", None)).await.unwrap();

        let updated = update_user(
            &db,
            UserUpdate { id: alice.id, user: new_user("alice@example.org", "alice2", None) },
        )
        .await
        .unwrap();
        assert_eq!(updated.email, "alice@example.org");
        assert_eq!(updated.name, "alice2");
        assert_eq!(find_user(&db, alice.id).await.unwrap(), updated);

        let taken = UserUpdate { id: alice.id, user: new_user("b@example.com", "x", None) };
        let err = update_user(&db, taken).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{err:?}");

        let missing = UserUpdate { id: 77, user: new_user("z@example.com", "z", None) };
        let err = update_user(&db, missing).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn common_friends_are_the_intersection_of_both_lists() {
        let db = testing::memory_db().await;
        let users = testing::insert_users(&db, 5).await;
        for &friend in &[users[2], users[3], users[4]] {
            add_friend(&db, users[0], friend).await.unwrap();
        }
        add_friend(&db, users[1], users[4]).await.unwrap();
        add_friend(&db, users[1], users[2]).await.unwrap();

        let shared: Vec<UserId> =
            common_friends(&db, users[0], users[1]).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(shared, vec![users[2], users[4]]);

        let reversed: Vec<UserId> =
            common_friends(&db, users[1], users[0]).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(reversed, shared);
        assert!(matches!(common_friends(&db, users[0], 99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn deleting_a_user_drops_their_friendships() {
        let db = testing::memory_db().await;
        let users = testing::insert_users(&db, 2).await;
        add_friend(&db, users[0], users[1]).await.unwrap();

        delete_user(&db, users[1]).await.unwrap();

        assert!(friends(&db, users[0]).await.unwrap().is_empty());
        let ids: Vec<UserId> = list_users(&db).await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![users[0]]);
        assert!(matches!(delete_user(&db, users[1]).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn befriending_unknown_user_is_not_found() {
        let db = testing::memory_db().await;
        let users = testing::insert_users(&db, 1).await;

        let err = add_friend(&db, users[0], 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
