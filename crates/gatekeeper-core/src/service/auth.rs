//! 회원가입과 로그인.

use std::sync::Arc;

use chrono::Utc;

use super::require_non_blank;
use crate::domain::{Account, NewAccount, Role};
use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::security::{CredentialHasher, IssuedToken, TokenIssuer};
use crate::store::{AccountRepository, TransactionSource, UnitOfWork};

/// 인증 서비스.
pub struct AuthService<S> {
    uow: UnitOfWork<S>,
    hasher: Arc<CredentialHasher>,
    issuer: Arc<TokenIssuer>,
}

impl<S> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self {
            uow: self.uow.clone(),
            hasher: Arc::clone(&self.hasher),
            issuer: Arc::clone(&self.issuer),
        }
    }
}

impl<S: TransactionSource> AuthService<S> {
    pub fn new(uow: UnitOfWork<S>, hasher: Arc<CredentialHasher>, issuer: Arc<TokenIssuer>) -> Self {
        Self {
            uow,
            hasher,
            issuer,
        }
    }

    /// 일반 사용자 계정 생성. 검증되지 않은 상태로 시작합니다.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ServiceResult<Account> {
        require_non_blank("email", email)?;
        require_non_blank("password", password)?;
        require_non_blank("display_name", display_name)?;

        let new_account = NewAccount {
            email: email.to_string(),
            password_hash: self.hasher.hash(password).await?,
            display_name: display_name.to_string(),
            role: Role::User,
        };

        let account = self
            .uow
            .run(move |tx| {
                Box::pin(async move { Ok::<_, ServiceError>(tx.create(new_account).await?) })
            })
            .await?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// 자격 증명 확인 후 토큰 발급.
    ///
    /// 조회, 검증, 마지막 로그인 갱신, 발급이 하나의 작업 단위입니다.
    /// 어느 단계든 실패하면 토큰은 반환되지 않고 로그인 시각도 남지 않습니다.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<IssuedToken> {
        let hasher = Arc::clone(&self.hasher);
        let issuer = Arc::clone(&self.issuer);
        let email = email.to_string();
        let password = password.to_string();

        let issued = self
            .uow
            .run(move |tx| Box::pin(login_in_tx(tx, hasher, issuer, email, password)))
            .await;

        match &issued {
            Ok(_) => tracing::info!("Login succeeded"),
            Err(ServiceError::InvalidCredentials) => tracing::debug!("Login rejected"),
            Err(e) => tracing::warn!(error = %e, "Login failed"),
        }

        issued
    }
}

async fn login_in_tx<R: AccountRepository>(
    tx: &mut R,
    hasher: Arc<CredentialHasher>,
    issuer: Arc<TokenIssuer>,
    email: String,
    password: String,
) -> ServiceResult<IssuedToken> {
    let account = match tx.find_by_email(&email).await {
        Ok(account) => account,
        Err(StoreError::NotFound) => {
            // 미존재 이메일도 같은 비용을 치르게 함
            hasher.verify_dummy(&password).await?;
            return Err(ServiceError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !hasher.verify(&password, &account.password_hash).await? {
        return Err(ServiceError::InvalidCredentials);
    }

    let now = Utc::now();
    tx.update_last_login(account.id, now).await?;

    let issued = issuer.issue_at(&account.id.to_string(), account.role, now)?;
    Ok(issued)
}
