pub mod director;
pub mod feed_event;
pub mod film;
pub mod film_director;
pub mod film_genre;
pub mod film_like;
pub mod friendship;
pub mod genre;
pub mod mpa_rating;
pub mod review;
pub mod review_rating;
pub mod user;
