use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
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

use crate::{include_res, linkify, res, session, session::USER_ID, AppResult};

use super::create_user;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterForm {
    username: String,
    password: String,
    confirm: String,
}

#[debug_handler]
pub(crate) async fn register_page(session: Session) -> AppResult<Response> {
    if session::viewer(&session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(Html(form_html(&session, "", &[]).await?).into_response())
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RegisterForm { username, password, confirm }): Form<RegisterForm>,
) -> AppResult<Response> {
    let username = username.trim();

    let mut errors = Vec::new();
    if !linkify::is_valid_handle(username) {
        errors.push("Username must be 1-30 letters, digits or underscores.");
    }
    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters.");
    }
    if password != confirm {
        errors.push("Passwords do not match.");
    }

    if errors.is_empty() {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        match create_user(&db_pool, username, &password_hash).await? {
            Some(user_id) => {
                session.insert(USER_ID, &user_id).await?;
                session::set_flash(&session, &format!("Welcome to Tweeter, {username}!")).await?;
                return Ok(Redirect::to("/").into_response());
            }
            None => errors.push("That username is taken."),
        }
    }

    let body = form_html(&session, username, &errors).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response())
}

async fn form_html(session: &Session, username: &str, errors: &[&'static str]) -> AppResult<String> {
    Ok(include_res!(str, "/pages/register.html")
        .replace("{nav}", &res::nav(None))
        .replace("{flash}", &res::flash_banner(session::take_flash(session).await?))
        .replace("{errors}", &res::errors_html(errors))
        .replace("{username}", &linkify::safe_attr(username)))
}
