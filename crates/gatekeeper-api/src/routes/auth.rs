//! 회원가입/로그인 endpoint (공개).

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use gatekeeper_core::{IssuedToken, TransactionSource};
use serde::Deserialize;
use validator::Validate;

use super::users::AccountResponse;
use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::state::AppState;

/// 회원가입 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,
    #[validate(length(min = 1, message = "비밀번호는 필수입니다"))]
    pub password: String,
    #[validate(length(min = 1, message = "이름은 필수입니다"))]
    pub display_name: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,
    #[validate(length(min = 1, message = "비밀번호는 필수입니다"))]
    pub password: String,
}

/// POST /api/v1/auth/register
pub async fn register<S: TransactionSource>(
    State(state): State<AppState<S>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let account = state
        .auth
        .register(&request.email, &request.password, &request.display_name)
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// POST /api/v1/auth/login
pub async fn login<S: TransactionSource>(
    State(state): State<AppState<S>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<IssuedToken>> {
    let issued = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(issued))
}

/// 인증 라우터 생성.
pub fn auth_router<S: TransactionSource>() -> Router<AppState<S>> {
    Router::new()
        .route("/register", post(register::<S>))
        .route("/login", post(login::<S>))
}
