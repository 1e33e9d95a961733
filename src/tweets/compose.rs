use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, feed, include_res, linkify, res, session, tags, AppError, AppResult};

use super::card;

pub(crate) const MAX_TWEET_CHARS: usize = 280;

#[derive(Debug, Deserialize)]
pub(crate) struct TweetForm {
    text: String,
    #[serde(default)]
    image: String,
}

#[debug_handler]
pub(crate) async fn create_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let viewer = session::require_current(&session, &db_pool, "/create").await?;
    let body =
        form_page(&session, &viewer, "Compose a tweet", "/create", "Tweet", "", "", &[]).await?;
    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(TweetForm { text, image }): Form<TweetForm>,
) -> AppResult<Response> {
    let viewer = session::require_current(&session, &db_pool, "/create").await?;

    let (text, image) = match validate(&text, &image) {
        Ok(clean) => clean,
        Err(errors) => {
            let body = form_page(
                &session,
                &viewer,
                "Compose a tweet",
                "/create",
                "Tweet",
                &text,
                &image,
                &errors,
            )
            .await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response());
        }
    };

    let id = Uuid::now_v7().to_string();
    let now = db::now();
    sqlx::query(
        "INSERT INTO tweets (id, user_id, text, image, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&viewer.id)
    .bind(&text)
    .bind(&image)
    .bind(now)
    .bind(now)
    .execute(&db_pool)
    .await?;
    tags::sync_tweet_tags(&db_pool, &id, &text).await?;

    session::set_flash(&session, "Your tweet has been posted!").await?;
    Ok(Redirect::to(&format!("/{id}")).into_response())
}

#[debug_handler]
pub(crate) async fn edit_page(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let tweet_id = super::tweet_id(&id)?;
    let viewer = session::require_current(&session, &db_pool, &format!("/{tweet_id}/edit")).await?;
    let (text, image) = owned_tweet(&db_pool, &tweet_id, &viewer.id).await?;

    let body = form_page(
        &session,
        &viewer,
        "Edit tweet",
        &format!("/{tweet_id}/edit"),
        "Save",
        &text,
        image.as_deref().unwrap_or(""),
        &[],
    )
    .await?;
    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn edit(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(TweetForm { text, image }): Form<TweetForm>,
) -> AppResult<Response> {
    let tweet_id = super::tweet_id(&id)?;
    let viewer = session::require_current(&session, &db_pool, &format!("/{tweet_id}/edit")).await?;
    owned_tweet(&db_pool, &tweet_id, &viewer.id).await?;

    let (text, image) = match validate(&text, &image) {
        Ok(clean) => clean,
        Err(errors) => {
            let body = form_page(
                &session,
                &viewer,
                "Edit tweet",
                &format!("/{tweet_id}/edit"),
                "Save",
                &text,
                &image,
                &errors,
            )
            .await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response());
        }
    };

    sqlx::query("UPDATE tweets SET text = ?, image = ?, updated_at = ? WHERE id = ?")
        .bind(&text)
        .bind(&image)
        .bind(db::now())
        .bind(&tweet_id)
        .execute(&db_pool)
        .await?;
    tags::sync_tweet_tags(&db_pool, &tweet_id, &text).await?;

    session::set_flash(&session, "Your tweet has been updated!").await?;
    Ok(Redirect::to(&format!("/{tweet_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn delete_page(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let tweet_id = super::tweet_id(&id)?;
    let viewer =
        session::require_current(&session, &db_pool, &format!("/{tweet_id}/delete")).await?;
    owned_tweet(&db_pool, &tweet_id, &viewer.id).await?;

    let card = feed::tweet_card(&db_pool, Some(&viewer.id), &tweet_id)
        .await?
        .ok_or(AppError::NotFound("tweet"))?;

    let body = include_res!(str, "/pages/confirm_delete.html")
        .replace("{nav}", &res::nav(Some(&viewer.username)))
        .replace("{flash}", &res::flash_banner(session::take_flash(&session).await?))
        .replace("{id}", &tweet_id)
        .replace("{card}", &card::tweet_card_html(&card, Some(&viewer.id)));
    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn delete(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let tweet_id = super::tweet_id(&id)?;
    let viewer =
        session::require_current(&session, &db_pool, &format!("/{tweet_id}/delete")).await?;
    owned_tweet(&db_pool, &tweet_id, &viewer.id).await?;

    // Likes, comments, tag links and notifications go with it. Tag rows
    // themselves are kept even when this was their last use.
    sqlx::query("DELETE FROM tweets WHERE id = ?")
        .bind(&tweet_id)
        .execute(&db_pool)
        .await?;

    session::set_flash(&session, "Tweet deleted successfully.").await?;
    Ok(Redirect::to("/").into_response())
}

/// Text and image of the tweet, provided it exists and belongs to the
/// viewer. Someone else's tweet reads the same as a missing one.
async fn owned_tweet(
    db_pool: &SqlitePool,
    tweet_id: &str,
    viewer_id: &str,
) -> AppResult<(String, Option<String>)> {
    let row: Option<(String, String, Option<String>)> =
        sqlx::query_as("SELECT user_id, text, image FROM tweets WHERE id = ?")
            .bind(tweet_id)
            .fetch_optional(db_pool)
            .await?;
    match row {
        Some((user_id, text, image)) if user_id == viewer_id => Ok((text, image)),
        _ => Err(AppError::NotFound("tweet")),
    }
}

fn validate(text: &str, image: &str) -> Result<(String, Option<String>), Vec<&'static str>> {
    let text = text.trim();
    let image = image.trim();
    let mut errors = Vec::new();
    if text.is_empty() {
        errors.push("Tweet text is required.");
    }
    if text.chars().count() > MAX_TWEET_CHARS {
        errors.push("Tweet text must be 280 characters or fewer.");
    }
    if !image.is_empty() && !linkify::is_valid_image_url(image) {
        errors.push("Image must be a plain http(s) URL.");
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok((
        text.to_string(),
        (!image.is_empty()).then(|| image.to_string()),
    ))
}

async fn form_page(
    session: &Session,
    viewer: &session::Viewer,
    heading: &str,
    action: &str,
    button: &str,
    text: &str,
    image: &str,
    errors: &[&'static str],
) -> AppResult<String> {
    Ok(include_res!(str, "/pages/tweet_form.html")
        .replace("{nav}", &res::nav(Some(&viewer.username)))
        .replace("{flash}", &res::flash_banner(session::take_flash(session).await?))
        .replace("{heading}", heading)
        .replace("{action}", action)
        .replace("{button}", button)
        .replace("{errors}", &res::errors_html(errors))
        .replace("{image}", &linkify::safe_attr(image))
        .replace("{text}", &linkify::safe_text(text)))
}
