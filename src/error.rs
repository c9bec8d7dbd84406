use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::AuthenticationRequired => Redirect::to("/login").into_response(),
            AppError::StorageUnavailable(e) => {
                error!(error = %e, "storage failure");
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable").into_response()
            }
        }
    }
}
