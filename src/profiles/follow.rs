use axum::{
    debug_handler,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    is_background, notify, redirect_back, session,
    social::{self, FollowOutcome},
    AppError, AppResult,
};

#[debug_handler]
pub(crate) async fn follow(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    headers: HeaderMap,
) -> AppResult<Response> {
    let viewer =
        session::require_current(&session, &db_pool, &format!("/profile/{username}")).await?;

    let Some((target_id,)): Option<(String,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&db_pool)
            .await?
    else {
        return Err(AppError::NotFound("profile"));
    };

    match social::toggle_follow(&db_pool, &viewer.id, &target_id).await? {
        FollowOutcome::SelfFollow => {
            if is_background(&headers) {
                let body = serde_json::json!({ "error": "you cannot follow yourself" });
                Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
            } else {
                session::set_flash(&session, "You cannot follow yourself.").await?;
                Ok(redirect_back(&headers).into_response())
            }
        }
        FollowOutcome::Toggled(state) => {
            if state.following {
                notify::emit(&db_pool, notify::Kind::Follow, &viewer.id, &target_id, None).await;
            }
            if is_background(&headers) {
                Ok(Json(state).into_response())
            } else {
                Ok(redirect_back(&headers).into_response())
            }
        }
    }
}
