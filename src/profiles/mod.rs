mod follow;
mod page;
mod settings;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{username}", get(page::profile))
        .route("/follow/{username}", post(follow::follow))
        .route("/settings", get(settings::settings_page).post(settings::save))
}
