use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::res;

pub type AppResult<T> = Result<T, AppError>;

/// Request-level failures. Validation problems are handled in the form
/// handlers themselves (re-rendered with messages) and never reach here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("login required")]
    LoginRequired { return_url: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Html(res::sorry(what))).into_response()
            }
            AppError::LoginRequired { return_url } => {
                Redirect::to(&format!(
                    "/login?return_url={}",
                    urlencoding::encode(&return_url)
                ))
                .into_response()
            }
            AppError::Internal(err) => {
                tracing::error!("unhandled error: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

macro_rules! internal_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                AppError::Internal(err.into())
            }
        }
    };
}

internal_impl!(sqlx::Error);
internal_impl!(tower_sessions::session::Error);
internal_impl!(argon2::password_hash::Error);
