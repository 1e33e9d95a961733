use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{db, feed, include_res, notify, res, session, AppError, AppResult};

use super::card;

#[debug_handler]
pub(crate) async fn detail(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let tweet_id = super::tweet_id(&id)?;
    let viewer = session::current_viewer(&session, &db_pool).await?;
    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());

    let card = feed::tweet_card(&db_pool, viewer_id, &tweet_id)
        .await?
        .ok_or(AppError::NotFound("tweet"))?;

    // Newest replies first, like the feed itself.
    let comments: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT u.username, c.text, c.created_at FROM comments c \
         JOIN users u ON u.id = c.user_id \
         WHERE c.tweet_id = ? ORDER BY c.created_at DESC, c.id DESC",
    )
    .bind(&card.id)
    .fetch_all(&db_pool)
    .await?;

    let comments_html = if comments.is_empty() {
        "<p class=\"empty\">No replies yet.</p>".to_string()
    } else {
        let mut out = String::new();
        for (username, text, created_at) in &comments {
            out += &card::comment_html(username, *created_at, text);
        }
        out
    };

    let comment_form = match &viewer {
        Some(_) => include_res!(str, "/pages/comment_form.html").replace("{id}", &card.id),
        None => format!(
            "<p><a href=\"/login?return_url=/{}\">Log in</a> to reply.</p>",
            card.id
        ),
    };

    let body = include_res!(str, "/pages/detail.html")
        .replace("{username}", &card.username)
        .replace("{nav}", &res::nav(viewer.as_ref().map(|v| v.username.as_str())))
        .replace("{flash}", &res::flash_banner(session::take_flash(&session).await?))
        .replace("{comments}", &comments_html)
        .replace("{comment_form}", &comment_form)
        .replace("{card}", &card::tweet_card_html(&card, viewer_id));

    Ok(Html(body).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentForm {
    text: String,
}

#[debug_handler]
pub(crate) async fn comment(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(CommentForm { text }): Form<CommentForm>,
) -> AppResult<Response> {
    let tweet_id = super::tweet_id(&id)?;
    let viewer = session::require_current(&session, &db_pool, &format!("/{tweet_id}")).await?;

    let Some((author_id,)): Option<(String,)> =
        sqlx::query_as("SELECT user_id FROM tweets WHERE id = ?")
            .bind(&tweet_id)
            .fetch_optional(&db_pool)
            .await?
    else {
        return Err(AppError::NotFound("tweet"));
    };

    // A blank reply is dropped without complaint.
    let text = text.trim();
    if !text.is_empty() {
        sqlx::query(
            "INSERT INTO comments (id, tweet_id, user_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(&tweet_id)
        .bind(&viewer.id)
        .bind(text)
        .bind(db::now())
        .execute(&db_pool)
        .await?;
        notify::emit(
            &db_pool,
            notify::Kind::Comment,
            &viewer.id,
            &author_id,
            Some(&tweet_id),
        )
        .await;
        session::set_flash(&session, "Your reply has been posted.").await?;
    }

    Ok(Redirect::to(&format!("/{tweet_id}")).into_response())
}
