//! 인증 및 계정 관리 서비스.
//!
//! 각 공개 연산은 하나의 [`UnitOfWork`](crate::store::UnitOfWork) 안에서 실행됩니다.
//! 비밀번호 해싱처럼 저장소가 필요 없는 계산은 트랜잭션을 열기 전에 끝냅니다.

mod accounts;
mod auth;

pub use accounts::{AccountChanges, AccountService, CreateAccount};
pub use auth::AuthService;

use crate::error::{ServiceError, ServiceResult};

fn require_non_blank(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(())
}
