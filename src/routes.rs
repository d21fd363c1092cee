use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    error::AppResult,
    feed, films,
    models::{
        Director, DirectorSort, FeedEvent, Film, FilmId, FilmUpdate, Genre, MpaRating, NewDirector,
        NewFilm, NewReview, NewUser, Review, ReviewUpdate, SearchScope, User, UserId, UserUpdate,
    },
    ranking, recommend, references, reviews, search, users,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/films", get(list_films).post(create_film).put(update_film))
        .route("/films/popular", get(popular))
        .route("/films/search", get(search_films))
        .route("/films/common", get(common_films))
        .route("/films/director/{director_id}", get(director_films))
        .route("/films/{id}", get(get_film).delete(delete_film))
        .route("/films/{id}/like/{user_id}", put(like_film).delete(unlike_film))
        .route("/users", get(list_users).post(create_user).put(update_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/friends", get(friends))
        .route("/users/{id}/friends/{friend_id}", put(add_friend).delete(remove_friend))
        .route("/users/{id}/friends/common/{other_id}", get(common_friends))
        .route("/users/{id}/recommendations", get(recommendations))
        .route("/users/{id}/feed", get(user_feed))
        .route("/genres", get(genres))
        .route("/genres/{id}", get(get_genre))
        .route("/mpa", get(mpa_ratings))
        .route("/mpa/{id}", get(get_mpa_rating))
        .route("/directors", get(directors).post(create_director).put(update_director))
        .route("/directors/{id}", get(get_director).delete(delete_director))
        .route("/reviews", get(list_reviews).post(create_review).put(update_review))
        .route("/reviews/{id}", get(get_review).delete(delete_review))
        .route("/reviews/{id}/like/{user_id}", put(like_review).delete(unlike_review))
        .route("/reviews/{id}/dislike/{user_id}", put(dislike_review).delete(undislike_review))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopularQuery {
    count: Option<i64>,
    genre_id: Option<i32>,
    year: Option<i16>,
}

async fn popular(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PopularQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let count = q.count.unwrap_or(state.config.popular_default_count);
    Ok(Json(ranking::popular(&state.db, count, q.genre_id, q.year).await?))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: String,
    by: Option<String>,
}

async fn search_films(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let scope = match q.by.as_deref() {
        Some(by) => by.parse()?,
        None => SearchScope::Title,
    };
    Ok(Json(search::search(&state.db, &q.query, scope).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonQuery {
    user_id: UserId,
    friend_id: UserId,
}

async fn common_films(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CommonQuery>,
) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(ranking::common(&state.db, q.user_id, q.friend_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectorFilmsQuery {
    sort_by: Option<String>,
}

async fn director_films(
    State(state): State<Arc<AppState>>,
    Path(director_id): Path<i32>,
    Query(q): Query<DirectorFilmsQuery>,
) -> AppResult<Json<Vec<Film>>> {
    let sort = match q.sort_by.as_deref() {
        Some(sort_by) => sort_by.parse()?,
        None => DirectorSort::Year,
    };
    Ok(Json(ranking::by_director(&state.db, director_id, sort).await?))
}

async fn list_films(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(films::list_films(&state.db).await?))
}

async fn create_film(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewFilm>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let film = films::create_film(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(film)))
}

async fn update_film(
    State(state): State<Arc<AppState>>,
    Json(update): Json<FilmUpdate>,
) -> AppResult<Json<Film>> {
    Ok(Json(films::update_film(&state.db, update).await?))
}

async fn get_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FilmId>,
) -> AppResult<Json<Film>> {
    Ok(Json(films::find_film(&state.db, id).await?))
}

async fn delete_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FilmId>,
) -> AppResult<StatusCode> {
    films::delete_film(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_film(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    films::add_like(&state.db, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlike_film(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(FilmId, UserId)>,
) -> AppResult<StatusCode> {
    films::remove_like(&state.db, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(&state.db).await?))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = users::create_user(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Json(update): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    Ok(Json(users::update_user(&state.db, update).await?))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<StatusCode> {
    users::delete_user(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<Json<User>> {
    Ok(Json(users::find_user(&state.db, id).await?))
}

async fn friends(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(users::friends(&state.db, id).await?))
}

async fn common_friends(
    State(state): State<Arc<AppState>>,
    Path((id, other_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(users::common_friends(&state.db, id, other_id).await?))
}

async fn add_friend(
    State(state): State<Arc<AppState>>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<StatusCode> {
    users::add_friend(&state.db, id, friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Path((id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<StatusCode> {
    users::remove_friend(&state.db, id, friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<Film>>> {
    Ok(Json(recommend::recommend(&state.db, id).await?))
}

async fn user_feed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<UserId>,
) -> AppResult<Json<Vec<FeedEvent>>> {
    Ok(Json(feed::feed(&state.db, id).await?))
}

async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(references::list_genres(&state.db).await?))
}

async fn get_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(references::find_genre(&state.db, id).await?))
}

async fn mpa_ratings(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<MpaRating>>> {
    Ok(Json(references::list_mpa_ratings(&state.db).await?))
}

async fn get_mpa_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<MpaRating>> {
    Ok(Json(references::find_mpa_rating(&state.db, id).await?))
}

async fn directors(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Director>>> {
    Ok(Json(references::list_directors(&state.db).await?))
}

async fn create_director(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewDirector>,
) -> AppResult<(StatusCode, Json<Director>)> {
    let director = references::create_director(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

async fn update_director(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Director>,
) -> AppResult<Json<Director>> {
    Ok(Json(references::update_director(&state.db, update).await?))
}

async fn get_director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Director>> {
    Ok(Json(references::find_director(&state.db, id).await?))
}

async fn delete_director(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    references::delete_director(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsQuery {
    film_id: Option<FilmId>,
    count: Option<u64>,
}

async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ReviewsQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let count = q.count.unwrap_or(state.config.reviews_default_count);
    Ok(Json(reviews::list_reviews(&state.db, q.film_id, count).await?))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = reviews::create_review(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ReviewUpdate>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::update_review(&state.db, update).await?))
}

async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::find_review(&state.db, id).await?))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    reviews::delete_review(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_review(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(i32, UserId)>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::rate(&state.db, id, user_id, true).await?))
}

async fn unlike_review(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(i32, UserId)>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::unrate(&state.db, id, user_id, true).await?))
}

async fn dislike_review(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(i32, UserId)>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::rate(&state.db, id, user_id, false).await?))
}

async fn undislike_review(
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(i32, UserId)>,
) -> AppResult<Json<Review>> {
    Ok(Json(reviews::unrate(&state.db, id, user_id, false).await?))
}
