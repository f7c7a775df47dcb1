//! 인증/인가 미들웨어.
//!
//! 토큰 검증과 역할 확인 로직은 `gatekeeper-core`에 있고,
//! 이 모듈은 이를 Axum 요청 파이프라인에 연결합니다.

mod middleware;

pub use middleware::{require_auth, require_role, CurrentPrincipal};
