use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use runtime::StartRunError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Era not found")]
    EraNotFound,

    #[error("No simulation run has been started")]
    NoRun,

    #[error("{0}")]
    InvalidAllocation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StartRunError> for AppError {
    fn from(err: StartRunError) -> Self {
        match err {
            StartRunError::Allocation(err) => Self::InvalidAllocation(err.to_string()),
            StartRunError::RunIdOverflow => Self::Internal(err.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EraNotFound | Self::NoRun => StatusCode::NOT_FOUND,
            Self::InvalidAllocation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
