use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, StoreError};

        match error {
            AppErr::Domain(DomainError::InvalidEvent { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_EVENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::InvalidQuery { field, reason }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_QUERY",
                format!("{}: {}", field, reason),
            ),
            AppErr::Store(store_err) => match store_err {
                StoreError::Unavailable { .. } | StoreError::Throttled { .. } => ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    store_err.to_string(),
                ),
                StoreError::RetriesExhausted { .. } | StoreError::DeadlineExceeded { .. } => {
                    ApiError::new(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_RETRIES_EXHAUSTED",
                        store_err.to_string(),
                    )
                }
                StoreError::Malformed { .. } | StoreError::Backend { .. } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    store_err.to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
