use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult};

pub const USER_ID: &str = "user_id";
pub const RETURN_URL: &str = "return_url";
pub const FLASH: &str = "flash";

/// Id of the signed-in user, if any.
pub async fn viewer(session: &Session) -> AppResult<Option<String>> {
    Ok(session.get::<String>(USER_ID).await?)
}

#[derive(Debug, Clone)]
pub struct Viewer {
    pub id: String,
    pub username: String,
}

/// Like [`viewer`], resolved to a username for page chrome. A session
/// pointing at a deleted user reads as anonymous.
pub async fn current_viewer(session: &Session, db_pool: &SqlitePool) -> AppResult<Option<Viewer>> {
    let Some(id) = viewer(session).await? else {
        return Ok(None);
    };
    let row: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id = ?")
        .bind(&id)
        .fetch_optional(db_pool)
        .await?;
    Ok(row.map(|(username,)| Viewer { id, username }))
}

/// The signed-in user, or a redirect to the login page carrying
/// `return_url` so the user comes back where they were headed.
pub async fn require_current(
    session: &Session,
    db_pool: &SqlitePool,
    return_url: &str,
) -> AppResult<Viewer> {
    current_viewer(session, db_pool)
        .await?
        .ok_or_else(|| AppError::LoginRequired {
            return_url: return_url.to_string(),
        })
}

/// One-shot status message shown on the next rendered page.
pub async fn set_flash(session: &Session, message: &str) -> AppResult<()> {
    session.insert(FLASH, message).await?;
    Ok(())
}

pub async fn take_flash(session: &Session) -> AppResult<Option<String>> {
    Ok(session.remove::<String>(FLASH).await?)
}
