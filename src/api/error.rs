use crate::services::stage::UpscaleError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<UpscaleError> for AppError {
    fn from(err: UpscaleError) -> Self {
        match err {
            UpscaleError::InputRejected(_) => AppError::BadRequest(err.to_string()),
            UpscaleError::LocalIo(_) => AppError::Internal(err.to_string()),
            UpscaleError::RemoteUpload(_) | UpscaleError::RemoteFetch(_) => {
                AppError::BadGateway(err.to_string())
            }
            UpscaleError::Decode(_) => AppError::Unprocessable(err.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::BadRequest(msg)
            | AppError::Unprocessable(msg)
            | AppError::BadGateway(msg) => msg,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upscale_error_status_mapping() {
        let cases = [
            (UpscaleError::InputRejected("x".into()), StatusCode::BAD_REQUEST),
            (UpscaleError::RemoteUpload("x".into()), StatusCode::BAD_GATEWAY),
            (UpscaleError::RemoteFetch("x".into()), StatusCode::BAD_GATEWAY),
            (UpscaleError::Decode("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                UpscaleError::LocalIo(std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
