use axum::{
    debug_handler,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{is_background, notify, redirect_back, session, social, AppError, AppResult};

#[debug_handler]
pub(crate) async fn like(
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    headers: HeaderMap,
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

    let state = social::toggle_like(&db_pool, &viewer.id, &tweet_id).await?;
    if state.liked {
        notify::emit(
            &db_pool,
            notify::Kind::Like,
            &viewer.id,
            &author_id,
            Some(&tweet_id),
        )
        .await;
    }

    if is_background(&headers) {
        Ok(Json(state).into_response())
    } else {
        Ok(redirect_back(&headers).into_response())
    }
}
