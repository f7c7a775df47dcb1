//! 메모리 기반 계정 저장소.
//!
//! 트랜잭션마다 쓰기 집합을 따로 두고 커밋 시점에 한 번에 반영합니다.
//! 롤백하거나 커밋 없이 드롭하면 쓰기 집합은 그대로 버려집니다.
//! 테스트와 데이터베이스 없는 로컬 실행에 사용합니다.
//!
//! 행마다 버전을 두는 낙관적 동시성 제어를 사용합니다. 트랜잭션이 처음 읽은 뒤
//! 다른 트랜잭션이 같은 행을 먼저 커밋했다면, 그 행을 쓴 트랜잭션의 커밋은
//! [`StoreError::Conflict`]로 거부됩니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountRepository, StoreResult, Transaction, TransactionSource};
use crate::domain::{Account, AccountUpdate, NewAccount};
use crate::error::StoreError;

/// 커밋된 행과 버전.
struct Row {
    account: Account,
    /// 커밋마다 1씩 증가
    version: u64,
}

#[derive(Default)]
struct Shared {
    /// 소프트 삭제된 행을 포함한 전체 테이블
    table: RwLock<HashMap<Uuid, Row>>,
    fail_last_login: AtomicBool,
    fail_commit: AtomicBool,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

/// 메모리 저장소.
///
/// 복제본은 같은 테이블을 공유합니다.
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후의 `update_last_login` 호출을 실패시킵니다.
    pub fn fail_last_login_updates(&self, enabled: bool) {
        self.shared.fail_last_login.store(enabled, Ordering::SeqCst);
    }

    /// 이후의 커밋을 실패시킵니다.
    pub fn fail_commits(&self, enabled: bool) {
        self.shared.fail_commit.store(enabled, Ordering::SeqCst);
    }

    /// 커밋된 전체 행 (소프트 삭제 포함, 생성 순).
    pub async fn snapshot(&self) -> Vec<Account> {
        let table = self.shared.table.read().await;
        let mut rows: Vec<Account> = table.values().map(|row| row.account.clone()).collect();
        sort_rows(&mut rows);
        rows
    }

    pub fn commit_count(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("commits", &self.commit_count())
            .field("rollbacks", &self.rollback_count())
            .finish()
    }
}

#[async_trait]
impl TransactionSource for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            writes: HashMap::new(),
            read_versions: HashMap::new(),
        })
    }
}

/// [`MemoryStore`]의 트랜잭션 핸들.
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    writes: HashMap<Uuid, Account>,
    /// 커밋된 행을 처음 읽었을 때의 버전
    read_versions: HashMap<Uuid, u64>,
}

fn sort_rows(rows: &mut [Account]) {
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

impl MemoryTransaction {
    /// 쓰기 집합을 커밋된 테이블 위에 덮어쓴 뷰.
    async fn merged(&mut self) -> HashMap<Uuid, Account> {
        let shared = Arc::clone(&self.shared);
        let table = shared.table.read().await;

        let mut rows = HashMap::with_capacity(table.len() + self.writes.len());
        for (id, row) in table.iter() {
            self.read_versions.entry(*id).or_insert(row.version);
            rows.insert(*id, row.account.clone());
        }
        rows.extend(self.writes.iter().map(|(id, row)| (*id, row.clone())));
        rows
    }

    async fn live(&mut self, id: Uuid) -> StoreResult<Account> {
        let row = match self.writes.get(&id) {
            Some(row) => Some(row.clone()),
            None => {
                let shared = Arc::clone(&self.shared);
                let table = shared.table.read().await;
                table.get(&id).map(|row| {
                    self.read_versions.entry(id).or_insert(row.version);
                    row.account.clone()
                })
            }
        };

        row.filter(|row| !row.is_deleted())
            .ok_or(StoreError::NotFound)
    }

    /// 이메일 유일성은 삭제된 행까지 포함해 검사합니다.
    async fn email_taken(&mut self, email: &str, except: Option<Uuid>) -> bool {
        self.merged()
            .await
            .values()
            .any(|row| row.email == email && Some(row.id) != except)
    }
}

#[async_trait]
impl AccountRepository for MemoryTransaction {
    async fn create(&mut self, account: NewAccount) -> StoreResult<Account> {
        if self.email_taken(&account.email, None).await {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let row = Account {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            display_name: account.display_name,
            is_verified: false,
            role: account.role,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.writes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&mut self, id: Uuid) -> StoreResult<Account> {
        self.live(id).await
    }

    async fn find_by_email(&mut self, email: &str) -> StoreResult<Account> {
        self.merged()
            .await
            .into_values()
            .find(|row| row.email == email && !row.is_deleted())
            .ok_or(StoreError::NotFound)
    }

    async fn find_all(&mut self) -> StoreResult<Vec<Account>> {
        let mut rows: Vec<Account> = self
            .merged()
            .await
            .into_values()
            .filter(|row| !row.is_deleted())
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }

    async fn update(&mut self, id: Uuid, changes: &AccountUpdate) -> StoreResult<Account> {
        let mut row = self.live(id).await?;
        if changes.email != row.email && self.email_taken(&changes.email, Some(id)).await {
            return Err(StoreError::DuplicateEmail);
        }

        row.email = changes.email.clone();
        row.password_hash = changes.password_hash.clone();
        row.display_name = changes.display_name.clone();
        row.role = changes.role;
        row.updated_at = Utc::now();

        self.writes.insert(id, row.clone());
        Ok(row)
    }

    async fn soft_delete(&mut self, id: Uuid) -> StoreResult<()> {
        let mut row = self.live(id).await?;
        let now = Utc::now();
        row.deleted_at = Some(now);
        row.updated_at = now;
        self.writes.insert(id, row);
        Ok(())
    }

    async fn update_last_login(&mut self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if self.shared.fail_last_login.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "injected update_last_login failure".to_string(),
            ));
        }

        let mut row = self.live(id).await?;
        row.last_login_at = Some(at);
        row.updated_at = Utc::now();
        self.writes.insert(id, row);
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self) -> StoreResult<()> {
        if self.shared.fail_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected commit failure".to_string()));
        }

        let mut table = self.shared.table.write().await;

        // 쓴 행이 읽은 뒤에 바뀌었거나, 새로 만든 행과 같은 id가 이미 있으면 충돌
        for id in self.writes.keys() {
            let current = table.get(id).map(|row| row.version);
            if current != self.read_versions.get(id).copied() {
                tracing::debug!(account_id = %id, "Write conflict on commit");
                return Err(StoreError::Conflict);
            }
        }

        // 다른 트랜잭션이 먼저 같은 이메일을 커밋했을 수 있음
        for row in self.writes.values() {
            let conflict = table.values().any(|other| {
                other.account.id != row.id
                    && other.account.email == row.email
                    && !self.writes.contains_key(&other.account.id)
            });
            if conflict {
                return Err(StoreError::DuplicateEmail);
            }
        }

        for (id, account) in self.writes {
            let version = table.get(&id).map_or(0, |row| row.version) + 1;
            table.insert(id, Row { account, version });
        }
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PasswordDigest, Role};

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: PasswordDigest::from_stored("digest"),
            display_name: "Kim".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let created = tx.create(new_account("kim@example.com")).await.unwrap();
        assert_eq!(tx.find_by_id(created.id).await.unwrap().email, "kim@example.com");

        let mut other = store.begin().await.unwrap();
        assert_eq!(other.find_by_id(created.id).await, Err(StoreError::NotFound));
        other.rollback().await.unwrap();

        tx.commit().await.unwrap();

        let mut after = store.begin().await.unwrap();
        assert_eq!(
            after.find_by_email("kim@example.com").await.unwrap().id,
            created.id
        );
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.rollback_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.create(new_account("kim@example.com")).await.unwrap();
        }

        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create(new_account("kim@example.com")).await.unwrap();
        assert_eq!(
            tx.create(new_account("kim@example.com")).await,
            Err(StoreError::DuplicateEmail)
        );
    }

    #[tokio::test]
    async fn test_commit_rechecks_email_uniqueness() {
        let store = MemoryStore::new();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.create(new_account("kim@example.com")).await.unwrap();
        second.create(new_account("kim@example.com")).await.unwrap();

        first.commit().await.unwrap();
        assert_eq!(second.commit().await, Err(StoreError::DuplicateEmail));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let keep = tx.create(new_account("keep@example.com")).await.unwrap();
        let gone = tx.create(new_account("gone@example.com")).await.unwrap();
        tx.soft_delete(gone.id).await.unwrap();

        assert_eq!(tx.find_by_id(gone.id).await, Err(StoreError::NotFound));
        assert_eq!(
            tx.find_by_email("gone@example.com").await,
            Err(StoreError::NotFound)
        );
        assert_eq!(tx.soft_delete(gone.id).await, Err(StoreError::NotFound));

        let all = tx.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep.id);
        tx.commit().await.unwrap();

        // 행은 물리적으로 남아 있음
        let rows = store.snapshot().await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|row| row.id == gone.id && row.is_deleted()));
    }

    #[tokio::test]
    async fn test_update_changes_whitelisted_fields_only() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let created = tx.create(new_account("kim@example.com")).await.unwrap();

        let mut changes = AccountUpdate::from(&created);
        changes.email = "lee@example.com".to_string();
        changes.display_name = "Lee".to_string();
        changes.role = Role::Admin;

        let updated = tx.update(created.id, &changes).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.email, "lee@example.com");
        assert_eq!(updated.display_name, "Lee");
        assert_eq!(updated.role, Role::Admin);
        assert!(!updated.is_verified);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create(new_account("kim@example.com")).await.unwrap();
        let lee = tx.create(new_account("lee@example.com")).await.unwrap();

        let mut changes = AccountUpdate::from(&lee);
        changes.email = "kim@example.com".to_string();
        assert_eq!(
            tx.update(lee.id, &changes).await,
            Err(StoreError::DuplicateEmail)
        );
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let created = tx.create(new_account("kim@example.com")).await.unwrap();

        store.fail_last_login_updates(true);
        assert!(matches!(
            tx.update_last_login(created.id, Utc::now()).await,
            Err(StoreError::Database(_))
        ));

        store.fail_commits(true);
        assert!(tx.commit().await.is_err());
        assert!(store.snapshot().await.is_empty());
    }

    async fn committed(store: &MemoryStore, email: &str) -> Account {
        let mut tx = store.begin().await.unwrap();
        let created = tx.create(new_account(email)).await.unwrap();
        tx.commit().await.unwrap();
        created
    }

    #[tokio::test]
    async fn test_stale_login_update_cannot_resurrect_deleted_account() {
        let store = MemoryStore::new();
        let account = committed(&store, "kim@example.com").await;

        let mut login = store.begin().await.unwrap();
        login.find_by_email("kim@example.com").await.unwrap();
        login.update_last_login(account.id, Utc::now()).await.unwrap();

        let mut delete = store.begin().await.unwrap();
        delete.soft_delete(account.id).await.unwrap();
        delete.commit().await.unwrap();

        assert_eq!(login.commit().await, Err(StoreError::Conflict));

        let rows = store.snapshot().await;
        assert!(rows[0].is_deleted());
        assert!(rows[0].last_login_at.is_none());

        let mut after = store.begin().await.unwrap();
        assert_eq!(after.find_by_id(account.id).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_stale_login_update_cannot_overwrite_profile_change() {
        let store = MemoryStore::new();
        let account = committed(&store, "kim@example.com").await;

        let mut login = store.begin().await.unwrap();
        login.find_by_email("kim@example.com").await.unwrap();

        let mut profile = store.begin().await.unwrap();
        let mut changes = AccountUpdate::from(&account);
        changes.display_name = "Kim Minsu".to_string();
        profile.update(account.id, &changes).await.unwrap();
        profile.commit().await.unwrap();

        login.update_last_login(account.id, Utc::now()).await.unwrap();
        assert_eq!(login.commit().await, Err(StoreError::Conflict));

        let rows = store.snapshot().await;
        assert_eq!(rows[0].display_name, "Kim Minsu");
        assert!(rows[0].last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_writes_to_different_rows_both_commit() {
        let store = MemoryStore::new();
        let kim = committed(&store, "kim@example.com").await;
        let lee = committed(&store, "lee@example.com").await;

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.update_last_login(kim.id, Utc::now()).await.unwrap();
        second.soft_delete(lee.id).await.unwrap();

        first.commit().await.unwrap();
        second.commit().await.unwrap();

        let rows = store.snapshot().await;
        assert!(rows.iter().any(|row| row.id == kim.id && row.last_login_at.is_some()));
        assert!(rows.iter().any(|row| row.id == lee.id && row.is_deleted()));
    }

    #[tokio::test]
    async fn test_sequential_updates_do_not_conflict() {
        let store = MemoryStore::new();
        let account = committed(&store, "kim@example.com").await;

        for _ in 0..3 {
            let mut tx = store.begin().await.unwrap();
            tx.update_last_login(account.id, Utc::now()).await.unwrap();
            tx.commit().await.unwrap();
        }
        assert_eq!(store.commit_count(), 4);
    }
}
