//! 统一的 JSON 响应包装：`{code, error_msg, result}`。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    code: u16,
    error_msg: String,
    result: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self::with_status(StatusCode::OK, result)
    }

    pub fn with_status(status: StatusCode, result: T) -> Self {
        Self {
            status,
            code: status.as_u16(),
            error_msg: String::new(),
            result,
        }
    }

    pub fn error_msg(mut self, message: impl Into<String>) -> Self {
        self.error_msg = message.into();
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
