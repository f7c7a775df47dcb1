//! 인증/인가 및 계정 저장소 전반의 에러 타입.
//!
//! 각 계층은 자신의 에러 enum을 반환하고, 서비스 계층에서 [`ServiceError`]로 합쳐집니다.
//! HTTP 상태 코드로의 변환은 API 크레이트의 책임입니다.

use thiserror::Error;

use crate::domain::Role;

/// 비밀번호 해싱 에러.
///
/// 비밀번호 불일치는 에러가 아니라 `verify`의 `false` 결과입니다.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패: {0}")]
    HashingFailed(String),
    #[error("잘못된 해시 파라미터: {0}")]
    InvalidParams(String),
}

/// 토큰 발급/검증 에러.
///
/// 진단용으로 구분되지만 경계에서는 하나의 "unauthorized"로 합쳐집니다.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("인증 헤더가 없습니다")]
    MissingCredential,
    #[error("잘못된 Authorization 헤더 형식")]
    MalformedHeader,
    #[error("유효하지 않은 토큰 서명")]
    InvalidSignature,
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("토큰 클레임이 유효하지 않습니다")]
    InvalidClaims,
    #[error("서명 키가 설정되지 않았습니다")]
    MissingSecret,
    #[error("토큰 서명 실패: {0}")]
    Signing(String),
}

impl TokenError {
    /// 요청 단위의 인증 실패인지 확인 (설정/서명 실패는 서버 결함).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TokenError::MissingSecret | TokenError::Signing(_))
    }
}

/// 역할 게이트 에러.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// 인증 게이트보다 먼저 실행된 경우 (서버 구성 오류)
    #[error("요청 컨텍스트에 역할 정보가 없습니다")]
    MissingRoleContext,
    #[error("권한이 부족합니다: {required} 역할 필요 (현재: {actual})")]
    Forbidden { required: Role, actual: Role },
}

/// 저장소 에러.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("계정을 찾을 수 없습니다")]
    NotFound,
    #[error("이미 사용 중인 이메일입니다")]
    DuplicateEmail,
    /// 읽은 뒤 다른 트랜잭션이 같은 행을 먼저 커밋함
    #[error("동시 수정 충돌")]
    Conflict,
    #[error("데이터베이스 에러: {0}")]
    Database(String),
    #[error("손상된 레코드: {0}")]
    Corrupt(String),
}

/// 서비스 계층 에러.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 이메일 미존재와 비밀번호 불일치를 구분하지 않습니다.
    #[error("이메일 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,
    #[error("계정을 찾을 수 없습니다")]
    NotFound,
    #[error("이미 사용 중인 이메일입니다")]
    DuplicateEmail,
    #[error("다른 요청이 먼저 계정을 변경했습니다")]
    Conflict,
    #[error("잘못된 입력: {0}")]
    Validation(String),
    #[error("권한이 부족합니다: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::DuplicateEmail => ServiceError::DuplicateEmail,
            StoreError::Conflict => ServiceError::Conflict,
            other => ServiceError::Store(other),
        }
    }
}

/// 서비스 작업을 위한 Result 타입.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        assert!(matches!(
            ServiceError::from(StoreError::NotFound),
            ServiceError::NotFound
        ));
        assert!(matches!(
            ServiceError::from(StoreError::DuplicateEmail),
            ServiceError::DuplicateEmail
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Conflict),
            ServiceError::Conflict
        ));
        assert!(matches!(
            ServiceError::from(StoreError::Database("timeout".to_string())),
            ServiceError::Store(StoreError::Database(_))
        ));
    }

    #[test]
    fn test_token_error_rejection() {
        assert!(TokenError::Expired.is_rejection());
        assert!(TokenError::MalformedHeader.is_rejection());
        assert!(!TokenError::MissingSecret.is_rejection());
        assert!(!TokenError::Signing("boom".to_string()).is_rejection());
    }
}
