use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use axum::{
    debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    include_res, linkify, res, session,
    session::{RETURN_URL, USER_ID},
    AppResult,
};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler]
pub(crate) async fn login_page(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    session: Session,
) -> AppResult<Response> {
    if session::viewer(&session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    if let Some(return_url) = return_url {
        session.insert(RETURN_URL, return_url).await?;
    }
    Ok(Html(form_html(&session, "", &[]).await?).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { username, password }): Form<LoginForm>,
) -> AppResult<Response> {
    let username = username.trim();

    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&db_pool)
            .await?;

    let Some((user_id, password_hash)) = row else {
        return rejected(&session, username).await;
    };
    if PasswordHash::new(&password_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_err()
    {
        return rejected(&session, username).await;
    }

    session.insert(USER_ID, &user_id).await?;

    // Only same-site paths are honored, anything else falls back to the
    // feed.
    let return_url: Option<String> = session.remove(RETURN_URL).await?;
    let return_url = match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") => url,
        _ => "/".to_string(),
    };
    Ok(Redirect::to(&return_url).into_response())
}

async fn rejected(session: &Session, username: &str) -> AppResult<Response> {
    let body = form_html(session, username, &["Wrong username or password."]).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response())
}

async fn form_html(session: &Session, username: &str, errors: &[&'static str]) -> AppResult<String> {
    Ok(include_res!(str, "/pages/login.html")
        .replace("{nav}", &res::nav(None))
        .replace("{flash}", &res::flash_banner(session::take_flash(session).await?))
        .replace("{errors}", &res::errors_html(errors))
        .replace("{username}", &linkify::safe_attr(username)))
}
