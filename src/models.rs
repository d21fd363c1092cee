use std::str::FromStr;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{
    entities::{director, feed_event, genre, mpa_rating, review, user},
    error::{AppError, AppResult},
};

pub type FilmId = i32;
pub type UserId = i32;

/// Case folding shared by stored search keys and search queries. Both sides
/// must go through the same function for non-ASCII names to match.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl From<genre::Model> for Genre {
    fn from(m: genre::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub id: i32,
    pub name: String,
}

impl From<director::Model> for Director {
    fn from(m: director::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpaRating {
    pub id: i32,
    pub name: String,
}

impl From<mpa_rating::Model> for MpaRating {
    fn from(m: mpa_rating::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: FilmId,
    pub name: String,
    pub description: String,
    pub release_date: Date,
    pub duration: i32,
    pub mpa: Option<MpaRating>,
    pub genres: Vec<Genre>,
    pub directors: Vec<Director>,
}

/// Reference to an existing row by id, as clients send it (`{"id": 3}`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct IdRef {
    pub id: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFilm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: Date,
    pub duration: i32,
    pub mpa: Option<IdRef>,
    #[serde(default)]
    pub genres: Vec<IdRef>,
    #[serde(default)]
    pub directors: Vec<IdRef>,
}

/// Full replacement of a film, genre and director links included.
#[derive(Clone, Debug, Deserialize)]
pub struct FilmUpdate {
    pub id: FilmId,
    #[serde(flatten)]
    pub film: NewFilm,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewDirector {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub login: String,
    pub name: String,
    pub birthday: Option<Date>,
}

impl TryFrom<user::Model> for User {
    type Error = AppError;

    fn try_from(m: user::Model) -> AppResult<Self> {
        let birthday = m.birthday.as_deref().map(str::parse::<Date>).transpose()?;
        Ok(Self { id: m.id, email: m.email, login: m.login, name: m.name, birthday })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub birthday: Option<Date>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserUpdate {
    pub id: UserId,
    #[serde(flatten)]
    pub user: NewUser,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: i32,
    pub content: String,
    pub is_positive: bool,
    pub user_id: UserId,
    pub film_id: FilmId,
    pub useful: i64,
}

impl From<review::Model> for Review {
    fn from(m: review::Model) -> Self {
        Self {
            review_id: m.id,
            content: m.content,
            is_positive: m.is_positive,
            user_id: m.user_id,
            film_id: m.film_id,
            useful: m.useful,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub content: String,
    pub is_positive: bool,
    pub user_id: UserId,
    pub film_id: FilmId,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub review_id: i32,
    pub content: String,
    pub is_positive: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Friend,
    Like,
    Review,
}

impl EventType {
    pub fn as_code(self) -> &'static str {
        match self {
            EventType::Friend => "FRIEND",
            EventType::Like => "LIKE",
            EventType::Review => "REVIEW",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FRIEND" => Some(EventType::Friend),
            "LIKE" => Some(EventType::Like),
            "REVIEW" => Some(EventType::Review),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    pub fn as_code(self) -> &'static str {
        match self {
            Operation::Add => "ADD",
            Operation::Remove => "REMOVE",
            Operation::Update => "UPDATE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ADD" => Some(Operation::Add),
            "REMOVE" => Some(Operation::Remove),
            "UPDATE" => Some(Operation::Update),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    pub event_id: i32,
    pub user_id: UserId,
    pub timestamp: i64,
    pub event_type: EventType,
    pub operation: Operation,
    pub entity_id: i32,
}

impl TryFrom<feed_event::Model> for FeedEvent {
    type Error = AppError;

    fn try_from(m: feed_event::Model) -> AppResult<Self> {
        let event_type = EventType::from_code(&m.event_type).ok_or_else(|| {
            anyhow::anyhow!("feed event {} has unknown type {:?}", m.id, m.event_type)
        })?;
        let operation = Operation::from_code(&m.operation).ok_or_else(|| {
            anyhow::anyhow!("feed event {} has unknown operation {:?}", m.id, m.operation)
        })?;
        Ok(Self {
            event_id: m.id,
            user_id: m.user_id,
            timestamp: m.timestamp,
            event_type,
            operation,
            entity_id: m.entity_id,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchScope {
    Title,
    Director,
    Both,
}

impl SearchScope {
    pub fn matches_title(self) -> bool {
        matches!(self, SearchScope::Title | SearchScope::Both)
    }

    pub fn matches_director(self) -> bool {
        matches!(self, SearchScope::Director | SearchScope::Both)
    }
}

impl FromStr for SearchScope {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim() {
            "title" => Ok(SearchScope::Title),
            "director" => Ok(SearchScope::Director),
            "title,director" | "director,title" => Ok(SearchScope::Both),
            other => Err(AppError::Validation(format!(
                "search scope must be 'title', 'director' or 'title,director', got {other:?}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DirectorSort {
    Year,
    Likes,
}

impl FromStr for DirectorSort {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim() {
            "year" => Ok(DirectorSort::Year),
            "likes" => Ok(DirectorSort::Likes),
            other => Err(AppError::Validation(format!(
                "sortBy must be 'year' or 'likes', got {other:?}"
            ))),
        }
    }
}
