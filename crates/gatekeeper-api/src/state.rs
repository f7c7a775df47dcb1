//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 해셔와 토큰 구성 요소는 시작 시 설정에서 한 번 만들어지고 `Arc`로 공유됩니다.

use std::sync::Arc;

use gatekeeper_core::{
    AccountService, AppConfig, AuthService, Authenticator, CredentialHasher, ServiceError,
    TokenIssuer, TokenValidator, TransactionSource, UnitOfWork,
};

/// 애플리케이션 공유 상태.
///
/// 저장소 백엔드 `S`에 대해 제네릭이며 PostgreSQL과 메모리 저장소 모두 사용할 수 있습니다.
pub struct AppState<S> {
    /// 회원가입/로그인
    pub auth: AuthService<S>,
    /// 계정 CRUD
    pub accounts: AccountService<S>,
    /// 인증 게이트 (미들웨어에서 사용)
    pub authenticator: Arc<Authenticator>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            accounts: self.accounts.clone(),
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<S: TransactionSource> AppState<S> {
    pub fn new(
        source: S,
        hasher: CredentialHasher,
        issuer: TokenIssuer,
        validator: TokenValidator,
    ) -> Self {
        let uow = UnitOfWork::new(source);
        let hasher = Arc::new(hasher);

        Self {
            auth: AuthService::new(uow.clone(), Arc::clone(&hasher), Arc::new(issuer)),
            accounts: AccountService::new(uow, hasher),
            authenticator: Arc::new(Authenticator::new(validator)),
        }
    }

    /// 설정으로부터 상태 생성. 서명 키가 없으면 실패합니다.
    pub fn from_config(source: S, config: &AppConfig) -> Result<Self, ServiceError> {
        Ok(Self::new(
            source,
            CredentialHasher::new(&config.password)?,
            TokenIssuer::from_config(&config.auth)?,
            TokenValidator::from_config(&config.auth)?,
        ))
    }
}

/// 테스트용 상태: 메모리 저장소와 저비용 해시 파라미터.
#[cfg(test)]
pub fn create_test_state() -> (gatekeeper_core::MemoryStore, AppState<gatekeeper_core::MemoryStore>) {
    use gatekeeper_core::{AuthConfig, MemoryStore, PasswordConfig};

    let auth = AuthConfig {
        jwt_secret: Some("test-secret-key-for-jwt-testing-minimum-32-chars".to_string().into()),
        token_ttl_hours: 24,
    };
    let password = PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };

    let store = MemoryStore::new();
    let state = AppState::new(
        store.clone(),
        CredentialHasher::new(&password).unwrap(),
        TokenIssuer::from_config(&auth).unwrap(),
        TokenValidator::from_config(&auth).unwrap(),
    );
    (store, state)
}
