use axum::{
    debug_handler,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{include_res, linkify, res, session, AppResult};

const MAX_BIO_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsForm {
    #[serde(default)]
    bio: String,
    #[serde(default)]
    image: String,
}

#[debug_handler]
pub(crate) async fn settings_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let viewer = session::require_current(&session, &db_pool, "/settings").await?;

    // The profile row is created with the user, so it is always there.
    let (bio, image): (String, Option<String>) =
        sqlx::query_as("SELECT bio, image FROM profiles WHERE user_id = ?")
            .bind(&viewer.id)
            .fetch_one(&db_pool)
            .await?;

    let body = form_page(
        &session,
        &viewer,
        &bio,
        image.as_deref().unwrap_or(""),
        &[],
    )
    .await?;
    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn save(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(SettingsForm { bio, image }): Form<SettingsForm>,
) -> AppResult<Response> {
    let viewer = session::require_current(&session, &db_pool, "/settings").await?;

    let bio = bio.trim();
    let image = image.trim();
    let mut errors = Vec::new();
    if bio.chars().count() > MAX_BIO_CHARS {
        errors.push("Bio must be 500 characters or fewer.");
    }
    if !image.is_empty() && !linkify::is_valid_image_url(image) {
        errors.push("Avatar must be a plain http(s) URL.");
    }
    if !errors.is_empty() {
        let body = form_page(&session, &viewer, bio, image, &errors).await?;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response());
    }

    sqlx::query("UPDATE profiles SET bio = ?, image = ? WHERE user_id = ?")
        .bind(bio)
        .bind((!image.is_empty()).then_some(image))
        .bind(&viewer.id)
        .execute(&db_pool)
        .await?;

    session::set_flash(&session, "Your profile has been updated.").await?;
    Ok(Redirect::to(&format!("/profile/{}", viewer.username)).into_response())
}

async fn form_page(
    session: &Session,
    viewer: &session::Viewer,
    bio: &str,
    image: &str,
    errors: &[&'static str],
) -> AppResult<String> {
    Ok(include_res!(str, "/pages/settings.html")
        .replace("{nav}", &res::nav(Some(&viewer.username)))
        .replace("{flash}", &res::flash_banner(session::take_flash(session).await?))
        .replace("{errors}", &res::errors_html(errors))
        .replace("{image}", &linkify::safe_attr(image))
        .replace("{bio}", &linkify::safe_text(bio)))
}
