//! API 에러 응답.
//!
//! 코어 에러를 HTTP 상태 코드와 JSON 본문으로 변환합니다.
//! 인증 실패의 세부 사유는 로그에만 남고 응답은 하나의 메시지로 통일됩니다.
//!
//! ```json
//! {
//!   "code": "UNAUTHORIZED",
//!   "message": "인증이 필요합니다",
//!   "timestamp": 1738300800
//! }
//! ```

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatekeeper_core::{AccessError, ServiceError, TokenError};
use serde::{Deserialize, Serialize};

/// API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "UNAUTHORIZED", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
    /// Unix timestamp
    pub timestamp: i64,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// 핸들러와 미들웨어가 반환하는 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// 요청 본문/경로 검증 실패
    #[error("잘못된 요청: {0}")]
    BadRequest(String),
}

const UNAUTHORIZED_MESSAGE: &str = "인증이 필요합니다";
const INVALID_CREDENTIALS_MESSAGE: &str = "이메일 또는 비밀번호가 올바르지 않습니다";
const INTERNAL_MESSAGE: &str = "내부 서버 오류가 발생했습니다";

fn token_status(err: &TokenError) -> (StatusCode, &'static str, String) {
    if err.is_rejection() {
        (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            UNAUTHORIZED_MESSAGE.to_string(),
        )
    } else {
        internal()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl ApiError {
    /// 상태 코드, 에러 코드, 공개 메시지.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Token(e) => token_status(e),
            ApiError::Access(AccessError::MissingRoleContext) => internal(),
            ApiError::Access(e @ AccessError::Forbidden { .. }) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
            }
            ApiError::Service(e) => match e {
                ServiceError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    INVALID_CREDENTIALS_MESSAGE.to_string(),
                ),
                ServiceError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
                ServiceError::DuplicateEmail => {
                    (StatusCode::CONFLICT, "DUPLICATE_EMAIL", e.to_string())
                }
                ServiceError::Conflict => (StatusCode::CONFLICT, "CONFLICT", e.to_string()),
                ServiceError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
                ServiceError::Token(token) => token_status(token),
                ServiceError::Store(_) | ServiceError::Password(_) => internal(),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, status = status.as_u16(), "Request rejected");
        }

        (status, Json(ApiErrorResponse::new(code, message))).into_response()
    }
}

/// 핸들러 패닉 시 응답 (`CatchPanicLayer::custom`에 전달).
///
/// 패닉 메시지는 로그에만 남깁니다.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = %detail, "Request handler panicked");

    let (status, code, message) = internal();
    (status, Json(ApiErrorResponse::new(code, message))).into_response()
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;
