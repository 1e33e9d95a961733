pub(crate) mod card;
mod compose;
mod detail;
mod like;
mod list;

use axum::{
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::{AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::feed_page))
        .route("/home", get(list::home_page))
        .route("/my", get(list::my_tweets))
        .route("/create", get(compose::create_page).post(compose::create))
        .route("/{id}", get(detail::detail))
        .route("/{id}/edit", get(compose::edit_page).post(compose::edit))
        .route("/{id}/delete", get(compose::delete_page).post(compose::delete))
        .route("/{id}/like", post(like::like))
        .route("/{id}/comment", post(detail::comment))
}

/// Tweet ids in the path are uuids; anything else reads the same as a
/// tweet that does not exist.
pub(crate) fn tweet_id(raw: &str) -> AppResult<String> {
    match Uuid::parse_str(raw) {
        Ok(id) => Ok(id.to_string()),
        Err(_) => Err(AppError::NotFound("tweet")),
    }
}
