use axum::{debug_handler, response::Redirect};
use tower_sessions::Session;

use crate::{session, AppResult};

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Redirect> {
    session.clear().await;
    session::set_flash(&session, "You have been logged out.").await?;
    Ok(Redirect::to("/"))
}
