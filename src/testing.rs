use sea_orm::{ActiveModelTrait, ConnectOptions, DatabaseConnection, Set};

use crate::{
    db,
    entities::{director, film, film_director, film_genre, film_like, user},
    models::{FilmId, UserId, fold_case},
};

pub const COMEDY: i32 = 1;
pub const DRAMA: i32 = 2;
pub const THRILLER: i32 = 4;

/// Fresh migrated database. One pooled connection, since every `:memory:`
/// connection is its own database.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    db::connect_and_migrate(options).await.expect("in-memory database")
}

pub async fn insert_user(db: &DatabaseConnection, login: &str) -> UserId {
    user::ActiveModel {
        id: Default::default(),
        email: Set(format!("{login}@example.com")),
        login: Set(login.to_string()),
        name: Set(login.to_string()),
        birthday: Set(None),
    }
    .insert(db)
    .await
    .expect("insert user")
    .id
}

pub async fn insert_users(db: &DatabaseConnection, count: usize) -> Vec<UserId> {
    let mut ids = Vec::with_capacity(count);
    for n in 1..=count {
        ids.push(insert_user(db, &format!("user{n}")).await);
    }
    ids
}

pub async fn insert_film(db: &DatabaseConnection, name: &str, release_date: &str) -> FilmId {
    film::ActiveModel {
        id: Default::default(),
        name: Set(name.to_string()),
        name_folded: Set(fold_case(name)),
        description: Set(format!("{name} description")),
        release_date: Set(release_date.to_string()),
        duration: Set(100),
        mpa_id: Set(Some(1)),
    }
    .insert(db)
    .await
    .expect("insert film")
    .id
}

pub async fn insert_films(db: &DatabaseConnection, count: usize) -> Vec<FilmId> {
    let mut ids = Vec::with_capacity(count);
    for n in 1..=count {
        ids.push(insert_film(db, &format!("Film {n}"), "2000-01-01").await);
    }
    ids
}

pub async fn insert_director(db: &DatabaseConnection, name: &str) -> i32 {
    director::ActiveModel {
        id: Default::default(),
        name: Set(name.to_string()),
        name_folded: Set(fold_case(name)),
    }
    .insert(db)
    .await
    .expect("insert director")
    .id
}

pub async fn attach_genre(db: &DatabaseConnection, film_id: FilmId, genre_id: i32) {
    film_genre::ActiveModel {
        id: Default::default(),
        film_id: Set(film_id),
        genre_id: Set(genre_id),
    }
    .insert(db)
    .await
    .expect("attach genre");
}

pub async fn attach_director(db: &DatabaseConnection, film_id: FilmId, director_id: i32) {
    film_director::ActiveModel {
        id: Default::default(),
        film_id: Set(film_id),
        director_id: Set(director_id),
    }
    .insert(db)
    .await
    .expect("attach director");
}

pub async fn like(db: &DatabaseConnection, film_id: FilmId, users: &[UserId]) {
    for &user_id in users {
        film_like::ActiveModel {
            id: Default::default(),
            film_id: Set(film_id),
            user_id: Set(user_id),
        }
        .insert(db)
        .await
        .expect("insert like");
    }
}
