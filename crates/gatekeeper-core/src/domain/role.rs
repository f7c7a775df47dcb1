//! 계정 역할.
//!
//! 역할은 닫힌 열거형이며, 토큰과 데이터베이스에는 소문자 문자열로 저장됩니다.

use serde::{Deserialize, Serialize};

/// 계정 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 일반 사용자 - 자기 계정만 조회/수정
    #[default]
    User,
    /// 관리자 - 모든 계정 관리
    Admin,
}

impl Role {
    /// 저장/전송용 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// 문자열에서 역할 파싱.
    ///
    /// 토큰 클레임과 DB 값은 정확히 소문자여야 합니다.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
