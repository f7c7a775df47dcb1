//! 계정 인증/관리 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - 인증 게이트/역할 게이트 미들웨어
//! - 코어 에러의 HTTP 응답 변환
//! - PostgreSQL 계정 저장소
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증/역할 미들웨어와 주체 추출기
//! - [`extract`]: 검증 추출기
//! - [`error`]: API 에러 응답
//! - [`repository`]: sqlx 기반 저장소

pub mod auth;
pub mod error;
pub mod extract;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{require_auth, require_role, CurrentPrincipal};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use extract::ValidatedJson;
pub use routes::create_api_router;
pub use state::AppState;
