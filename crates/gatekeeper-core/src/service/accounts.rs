//! 계정 관리 (관리자 CRUD, 본인 프로필).

use std::sync::Arc;

use uuid::Uuid;

use super::require_non_blank;
use crate::domain::{Account, AccountUpdate, NewAccount, PasswordDigest, Principal, Role};
use crate::error::{ServiceError, ServiceResult};
use crate::security::CredentialHasher;
use crate::store::{AccountRepository, TransactionSource, UnitOfWork};

/// 관리자 계정 생성 입력.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
    /// 없으면 [`Role::User`]
    pub role: Option<Role>,
}

/// 부분 갱신 입력. `None`인 필드는 유지됩니다.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

/// 해싱까지 끝난 갱신 내용.
struct PreparedChanges {
    email: Option<String>,
    password_hash: Option<PasswordDigest>,
    display_name: Option<String>,
    role: Option<Role>,
}

impl PreparedChanges {
    fn apply(self, account: &Account) -> AccountUpdate {
        let mut update = AccountUpdate::from(account);
        if let Some(email) = self.email {
            update.email = email;
        }
        if let Some(password_hash) = self.password_hash {
            update.password_hash = password_hash;
        }
        if let Some(display_name) = self.display_name {
            update.display_name = display_name;
        }
        if let Some(role) = self.role {
            update.role = role;
        }
        update
    }
}

/// 계정 서비스.
pub struct AccountService<S> {
    uow: UnitOfWork<S>,
    hasher: Arc<CredentialHasher>,
}

impl<S> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            uow: self.uow.clone(),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl<S: TransactionSource> AccountService<S> {
    pub fn new(uow: UnitOfWork<S>, hasher: Arc<CredentialHasher>) -> Self {
        Self { uow, hasher }
    }

    pub async fn create(&self, input: CreateAccount) -> ServiceResult<Account> {
        require_non_blank("email", &input.email)?;
        require_non_blank("password", &input.password)?;
        require_non_blank("display_name", &input.display_name)?;

        let new_account = NewAccount {
            password_hash: self.hasher.hash(&input.password).await?,
            email: input.email,
            display_name: input.display_name,
            role: input.role.unwrap_or_default(),
        };

        let account = self
            .uow
            .run(move |tx| {
                Box::pin(async move { Ok::<_, ServiceError>(tx.create(new_account).await?) })
            })
            .await?;

        tracing::info!(account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    pub async fn find_by_id(&self, id: Uuid) -> ServiceResult<Account> {
        self.uow
            .run(move |tx| Box::pin(async move { Ok::<_, ServiceError>(tx.find_by_id(id).await?) }))
            .await
    }

    /// 토큰 주체의 계정.
    pub async fn me(&self, principal: &Principal) -> ServiceResult<Account> {
        self.find_by_id(principal_account_id(principal)?).await
    }

    pub async fn find_all(&self) -> ServiceResult<Vec<Account>> {
        self.uow
            .run(|tx| Box::pin(async move { Ok::<_, ServiceError>(tx.find_all().await?) }))
            .await
    }

    /// 관리자 갱신. 역할도 바꿀 수 있습니다.
    pub async fn update(&self, id: Uuid, changes: AccountChanges) -> ServiceResult<Account> {
        let prepared = self.prepare(changes).await?;

        let account = self
            .uow
            .run(move |tx| Box::pin(update_in_tx(tx, id, prepared)))
            .await?;

        tracing::info!(account_id = %account.id, "Account updated");
        Ok(account)
    }

    /// 본인 프로필 갱신.
    ///
    /// 자기 역할 변경 요청은 [`ServiceError::Forbidden`]으로 거부됩니다.
    pub async fn update_me(
        &self,
        principal: &Principal,
        changes: AccountChanges,
    ) -> ServiceResult<Account> {
        let id = principal_account_id(principal)?;
        if let Some(role) = changes.role {
            tracing::warn!(
                subject = %principal.subject(),
                requested = %role,
                "Self-service role change rejected"
            );
            return Err(ServiceError::Forbidden(
                "role cannot be changed through self-service update".to_string(),
            ));
        }

        self.update(id, changes).await
    }

    /// 조회 후 소프트 삭제.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.uow
            .run(move |tx| {
                Box::pin(async move {
                    let account = tx.find_by_id(id).await?;
                    tx.soft_delete(account.id).await?;
                    Ok::<_, ServiceError>(())
                })
            })
            .await?;

        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }

    async fn prepare(&self, changes: AccountChanges) -> ServiceResult<PreparedChanges> {
        if let Some(email) = &changes.email {
            require_non_blank("email", email)?;
        }
        if let Some(display_name) = &changes.display_name {
            require_non_blank("display_name", display_name)?;
        }

        let password_hash = match &changes.password {
            Some(password) => {
                require_non_blank("password", password)?;
                Some(self.hasher.hash(password).await?)
            }
            None => None,
        };

        Ok(PreparedChanges {
            email: changes.email,
            password_hash,
            display_name: changes.display_name,
            role: changes.role,
        })
    }
}

async fn update_in_tx<R: AccountRepository>(
    tx: &mut R,
    id: Uuid,
    prepared: PreparedChanges,
) -> ServiceResult<Account> {
    let account = tx.find_by_id(id).await?;
    let update = prepared.apply(&account);
    Ok(tx.update(id, &update).await?)
}

fn principal_account_id(principal: &Principal) -> ServiceResult<Uuid> {
    principal.account_id().ok_or(ServiceError::NotFound)
}
