//! 인증 게이트와 역할 게이트.
//!
//! 두 게이트는 독립적으로 조합됩니다. "인증만" 필요한 자원은 [`Authenticator`]만,
//! "인증 + 특정 역할"이 필요한 자원은 [`Authenticator`] 뒤에 [`RoleGate`]를 둡니다.

use chrono::{DateTime, Utc};

use super::token::TokenValidator;
use crate::domain::{Principal, Role};
use crate::error::{AccessError, TokenError};

/// Authorization 헤더의 스킴.
pub const BEARER_SCHEME: &str = "Bearer";

/// `Authorization` 헤더 값에서 토큰 추출.
///
/// 공백 하나로 구분된 정확히 두 필드(`Bearer <token>`)만 허용합니다.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, TokenError> {
    let header = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(TokenError::MissingCredential),
    };

    let mut fields = header.split(' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(TokenError::MalformedHeader),
    }
}

/// 인증 게이트.
///
/// 요청마다 헤더를 해석하고 토큰을 검증해 [`Principal`]을 만듭니다.
pub struct Authenticator {
    validator: TokenValidator,
}

impl Authenticator {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }

    /// 헤더 값으로 요청 주체 인증.
    pub fn authenticate(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Principal, TokenError> {
        let result = parse_bearer(header).and_then(|token| self.validator.validate(token, now));

        match &result {
            Ok(principal) => {
                tracing::trace!(subject = %principal.subject(), role = %principal.role(), "Request authenticated");
            }
            Err(e) => {
                tracing::debug!(reason = %e, "Authentication rejected");
            }
        }

        result
    }
}

/// 역할 게이트.
///
/// 인증 게이트가 남긴 주체의 역할이 요구 역할과 같은지만 확인합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    required: Role,
}

impl RoleGate {
    pub fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn admin_only() -> Self {
        Self::new(Role::Admin)
    }

    pub fn required(&self) -> Role {
        self.required
    }

    /// 요청 컨텍스트의 주체 검사.
    ///
    /// 주체가 없으면 게이트 순서가 잘못된 것이므로 [`AccessError::MissingRoleContext`].
    pub fn check(&self, principal: Option<&Principal>) -> Result<(), AccessError> {
        let principal = principal.ok_or_else(|| {
            tracing::error!(required = %self.required, "Role gate ran without an authenticated principal");
            AccessError::MissingRoleContext
        })?;

        if principal.role() != self.required {
            tracing::debug!(
                subject = %principal.subject(),
                required = %self.required,
                actual = %principal.role(),
                "Authorization rejected"
            );
            return Err(AccessError::Forbidden {
                required: self.required,
                actual: principal.role(),
            });
        }

        Ok(())
    }
}
