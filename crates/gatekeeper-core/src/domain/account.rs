//! 계정 엔티티.
//!
//! 비밀번호는 항상 [`PasswordDigest`]로만 보관되며 평문은 이 타입을 통과하지 않습니다.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Role;

/// PHC 형식의 비밀번호 해시.
///
/// 크레이트 외부에서 새 다이제스트를 만드는 경로는 [`PasswordDigest::from_stored`]뿐이며,
/// 이는 저장소에서 읽어온 값을 복원할 때만 사용합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub(crate) fn new(phc: String) -> Self {
        Self(phc)
    }

    /// 저장소에 보관된 해시 문자열 복원.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

/// 영속 계정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: PasswordDigest,
    pub display_name: String,
    pub is_verified: bool,
    pub role: Role,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 소프트 삭제 표시. `Some`이면 모든 조회에서 제외됩니다.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// 새 계정 생성 입력.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: PasswordDigest,
    pub display_name: String,
    pub role: Role,
}

/// 갱신 가능한 필드 집합.
///
/// ID, 생성 시각, 검증 여부, 삭제 표시는 여기에 없으므로 `update`로 바꿀 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub email: String,
    pub password_hash: PasswordDigest,
    pub display_name: String,
    pub role: Role,
}

impl From<&Account> for AccountUpdate {
    fn from(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            display_name: account.display_name.clone(),
            role: account.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_debug_is_redacted() {
        let digest = PasswordDigest::from_stored("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA");
        assert_eq!(format!("{:?}", digest), "PasswordDigest(***)");
    }

    #[test]
    fn test_update_from_account_copies_mutable_fields() {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: "kim@example.com".to_string(),
            password_hash: PasswordDigest::from_stored("digest"),
            display_name: "Kim".to_string(),
            is_verified: false,
            role: Role::Admin,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let update = AccountUpdate::from(&account);
        assert_eq!(update.email, account.email);
        assert_eq!(update.display_name, account.display_name);
        assert_eq!(update.role, Role::Admin);
        assert!(!account.is_deleted());
    }
}
