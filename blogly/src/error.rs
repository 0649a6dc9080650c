use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use blogly_core::RepoError;
use thiserror::Error;

use crate::views;

/// Errors a request handler can end with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("repository failure: {0}")]
    Repo(#[from] RepoError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound(_) | AppError::Repo(RepoError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            let cause = std::error::Error::source(&self)
                .and_then(std::error::Error::source)
                .map(ToString::to_string);
            tracing::error!(error = %self, cause = ?cause, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Html(views::error_page(status))).into_response()
    }
}
