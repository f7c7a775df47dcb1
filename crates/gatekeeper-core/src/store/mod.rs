//! 계정 저장소 추상화와 작업 단위(Unit of Work).
//!
//! 모든 저장소 호출은 [`TransactionSource::begin`]으로 연 트랜잭션 핸들 위에서 실행되며,
//! 핸들의 종료(커밋/롤백)는 [`UnitOfWork::run`]이 책임집니다.

mod memory;
mod unit_of_work;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Account, AccountUpdate, NewAccount};
use crate::error::StoreError;

pub use memory::{MemoryStore, MemoryTransaction};
pub use unit_of_work::UnitOfWork;

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 계정 영속성 연산.
///
/// 조회 연산은 소프트 삭제된 계정을 [`StoreError::NotFound`]로 보고합니다.
#[async_trait]
pub trait AccountRepository: Send {
    /// 새 계정 저장. 이메일이 이미 있으면 [`StoreError::DuplicateEmail`].
    async fn create(&mut self, account: NewAccount) -> StoreResult<Account>;

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Account>;

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Account>;

    /// 삭제되지 않은 모든 계정 (생성 시각 순).
    async fn find_all(&mut self) -> StoreResult<Vec<Account>>;

    /// 허용된 필드(이메일, 비밀번호 해시, 표시 이름, 역할)만 갱신.
    async fn update(&mut self, id: Uuid, changes: &AccountUpdate) -> StoreResult<Account>;

    /// 삭제 표시만 설정합니다. 이미 삭제된 계정이면 [`StoreError::NotFound`].
    async fn soft_delete(&mut self, id: Uuid) -> StoreResult<()>;

    async fn update_last_login(&mut self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
}

/// 열린 트랜잭션 핸들.
///
/// `commit`/`rollback`은 핸들을 소비하므로 한 번만 닫힐 수 있습니다.
/// 어느 쪽도 호출되지 않고 드롭되면 롤백으로 처리되어야 합니다.
#[async_trait]
pub trait Transaction: AccountRepository + Sized {
    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}

/// 트랜잭션을 여는 저장소 백엔드.
#[async_trait]
pub trait TransactionSource: Send + Sync + 'static {
    type Tx: Transaction + 'static;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}
