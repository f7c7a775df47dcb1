//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/api/v1/auth` - 회원가입, 로그인 (공개)
//! - `/api/v1/users/me` - 본인 계정 (인증)
//! - `/api/v1/users` - 계정 관리 (인증 + admin)

pub mod auth;
pub mod health;
pub mod users;

use std::sync::Arc;

use axum::Router;
use gatekeeper_core::TransactionSource;

pub use auth::{auth_router, LoginRequest, RegisterRequest};
pub use health::{health_router, HealthResponse};
pub use users::{
    users_router, AccountResponse, CreateAccountRequest, MessageResponse, UpdateAccountRequest,
};

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 트레이싱, CORS 같은 공통 레이어는 바이너리에서 덧붙입니다.
pub fn create_api_router<S: TransactionSource>(state: AppState<S>) -> Router {
    let authenticator = Arc::clone(&state.authenticator);

    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/auth", auth_router::<S>())
        .nest("/api/v1/users", users_router::<S>(authenticator))
        .with_state(state)
}
