//! 인증된 요청 주체.

use uuid::Uuid;

use super::Role;

/// 검증된 토큰에서 복원한 요청 단위 신원.
///
/// 저장되지 않으며 요청마다 토큰에서 다시 만들어집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    role: Role,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// 토큰의 `sub` 클레임 (계정 ID 문자열).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// 계정 ID로 해석. UUID 형식이 아니면 `None`.
    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.subject).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_parsing() {
        let id = Uuid::new_v4();
        let principal = Principal::new(id.to_string(), Role::User);
        assert_eq!(principal.account_id(), Some(id));

        let opaque = Principal::new("user-123", Role::Admin);
        assert_eq!(opaque.subject(), "user-123");
        assert_eq!(opaque.account_id(), None);
    }
}
