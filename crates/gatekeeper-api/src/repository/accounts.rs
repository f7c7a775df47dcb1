//! 계정 저장소 (PostgreSQL).
//!
//! 모든 쿼리는 [`PgTransaction`]이 감싼 sqlx 트랜잭션 위에서 실행됩니다.
//! 커밋하지 않고 드롭된 트랜잭션은 드라이버가 롤백합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeeper_core::{
    Account, AccountRepository, AccountUpdate, NewAccount, PasswordDigest, Role, StoreError,
    StoreResult, Transaction, TransactionSource,
};
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// 계정 레코드.
///
/// accounts 테이블의 데이터베이스 표현입니다.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub is_verified: bool,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = StoreError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let role = Role::parse(&record.role).ok_or_else(|| {
            StoreError::Corrupt(format!("account {} has unknown role", record.id))
        })?;

        Ok(Account {
            id: record.id,
            email: record.email,
            password_hash: PasswordDigest::from_stored(record.password_hash),
            display_name: record.display_name,
            is_verified: record.is_verified,
            role,
            last_login_at: record.last_login_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
        })
    }
}

/// sqlx 에러를 저장소 에러로 변환.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        // serialization_failure, deadlock_detected
        sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("40001" | "40P01")) => {
            StoreError::Conflict
        }
        _ => StoreError::Database(err.to_string()),
    }
}

fn into_account(record: Option<AccountRecord>) -> StoreResult<Account> {
    record.ok_or(StoreError::NotFound)?.try_into()
}

/// PostgreSQL 트랜잭션 소스.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl TransactionSource for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> StoreResult<PgTransaction> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(PgTransaction { tx })
    }
}

/// [`PgStore`]의 트랜잭션 핸들.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountRepository for PgTransaction {
    async fn create(&mut self, account: NewAccount) -> StoreResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            INSERT INTO accounts (id, email, password_hash, display_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(account.password_hash.as_str())
        .bind(&account.display_name)
        .bind(account.role.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        record.try_into()
    }

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT * FROM accounts WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        into_account(record)
    }

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT * FROM accounts WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        into_account(record)
    }

    async fn find_all(&mut self) -> StoreResult<Vec<Account>> {
        let records = sqlx::query_as::<_, AccountRecord>(
            "SELECT * FROM accounts WHERE deleted_at IS NULL ORDER BY created_at, id",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        records.into_iter().map(Account::try_from).collect()
    }

    async fn update(&mut self, id: Uuid, changes: &AccountUpdate) -> StoreResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            UPDATE accounts
            SET email = $2,
                password_hash = $3,
                display_name = $4,
                role = $5,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.email)
        .bind(changes.password_hash.as_str())
        .bind(&changes.display_name)
        .bind(changes.role.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        into_account(record)
    }

    async fn soft_delete(&mut self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_last_login(&mut self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET last_login_at = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}
