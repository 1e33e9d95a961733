pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod linkify;
pub mod notify;
pub mod profiles;
pub mod res;
pub mod session;
pub mod social;
pub mod tags;
pub mod tweets;

use axum::{
    extract::FromRef,
    http::{header, HeaderMap},
    response::Redirect,
    routing::get,
    Router,
};
use serde::{Deserialize, Deserializer};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use error::{AppError, AppResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

pub fn app(app_state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(12)));

    Router::new()
        .route("/style.css", get(res::style))
        .route("/toggle.js", get(res::toggle_js))
        .merge(auth::router())
        .merge(profiles::router())
        .merge(tweets::router())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(session_layer)
}

/// A scripted client marks itself with this header and gets JSON back;
/// everything else is a plain form submission and gets redirects.
pub(crate) fn is_background(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .is_some_and(|v| v.as_bytes() == b"XMLHttpRequest")
}

pub(crate) fn redirect_back(headers: &HeaderMap) -> Redirect {
    match headers.get(header::REFERER).and_then(|v| v.to_str().ok()) {
        Some(referer) => Redirect::to(referer),
        None => Redirect::to("/"),
    }
}

/// Page numbers come from hand-editable query strings. Anything that
/// does not parse reads as absent, so the feed clamps to page one
/// instead of failing the request.
pub(crate) fn lenient_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().ok())
}
