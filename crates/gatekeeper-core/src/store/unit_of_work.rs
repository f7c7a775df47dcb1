//! 작업 단위(Unit of Work).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{Transaction, TransactionSource};
use crate::error::StoreError;

/// 하나의 논리 연산을 트랜잭션으로 감싸는 실행기.
///
/// 모든 종료 경로에서 커밋 또는 롤백이 정확히 한 번 일어납니다.
///
/// | 연산 결과 | 처리 |
/// |-----------|------|
/// | `Ok`      | 커밋, 커밋 실패는 그대로 반환 |
/// | `Err`     | 롤백, 연산의 에러 반환 (롤백 실패는 로그만) |
/// | panic     | 롤백 후 panic 재개 |
///
/// 실행 중인 future가 취소되면 트랜잭션 핸들이 드롭되며 백엔드가 롤백합니다.
pub struct UnitOfWork<S> {
    source: Arc<S>,
}

impl<S> Clone for UnitOfWork<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: TransactionSource> UnitOfWork<S> {
    pub fn new(source: S) -> Self {
        Self::from_arc(Arc::new(source))
    }

    pub fn from_arc(source: Arc<S>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 트랜잭션 안에서 `op` 실행.
    ///
    /// 재시도는 하지 않습니다. `op`가 반환하는 future는 트랜잭션 핸들만 빌릴 수 있으므로
    /// 필요한 값은 소유권을 넘겨 캡처해야 합니다.
    pub async fn run<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
        T: Send,
        E: From<StoreError> + std::fmt::Display + Send,
    {
        let mut tx = self.source.begin().await?;

        let outcome = AssertUnwindSafe(op(&mut tx)).catch_unwind().await;

        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await?;
                Ok(value)
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "Operation failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        error = %rollback_err,
                        original = %err,
                        "Rollback failed after operation error"
                    );
                }
                Err(err)
            }
            Err(panic) => {
                tracing::error!("Operation panicked, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed after panic");
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewAccount, PasswordDigest, Role};
    use crate::store::{AccountRepository, MemoryStore};
    use std::time::Duration;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: PasswordDigest::from_stored("digest"),
            display_name: "Kim".to_string(),
            role: Role::User,
        }
    }

    fn uow() -> (MemoryStore, UnitOfWork<MemoryStore>) {
        let store = MemoryStore::new();
        (store.clone(), UnitOfWork::new(store))
    }

    #[tokio::test]
    async fn test_success_commits() {
        let (store, uow) = uow();

        let id = uow
            .run(|tx| {
                Box::pin(async move {
                    let account = tx.create(new_account("kim@example.com")).await?;
                    Ok::<_, StoreError>(account.id)
                })
            })
            .await
            .unwrap();

        let rows = store.snapshot().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.rollback_count(), 0);
    }

    #[tokio::test]
    async fn test_error_rolls_back_all_writes() {
        let (store, uow) = uow();
        let before = store.snapshot().await;

        let result = uow
            .run(|tx| {
                Box::pin(async move {
                    tx.create(new_account("kim@example.com")).await?;
                    tx.create(new_account("lee@example.com")).await?;
                    Err::<(), _>(StoreError::Database("second step failed".to_string()))
                })
            })
            .await;

        assert_eq!(
            result,
            Err(StoreError::Database("second step failed".to_string()))
        );
        assert_eq!(store.snapshot().await, before);
        assert_eq!(store.rollback_count(), 1);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_panic_after_first_write_rolls_back_and_resumes() {
        let (store, uow) = uow();

        let result = AssertUnwindSafe(uow.run(|tx| {
            Box::pin(async move {
                tx.create(new_account("kim@example.com")).await?;
                if tx.find_by_email("kim@example.com").await.is_ok() {
                    panic!("failure between dependent writes");
                }
                tx.create(new_account("lee@example.com")).await?;
                Ok::<_, StoreError>(())
            })
        }))
        .catch_unwind()
        .await;

        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<&str>(),
            Some(&"failure between dependent writes")
        );
        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.rollback_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_is_surfaced() {
        let (store, uow) = uow();
        store.fail_commits(true);

        let result = uow
            .run(|tx| {
                Box::pin(async move {
                    tx.create(new_account("kim@example.com")).await?;
                    Ok::<_, StoreError>(())
                })
            })
            .await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_operation_leaves_no_trace() {
        let (store, uow) = uow();

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            uow.run(|tx| {
                Box::pin(async move {
                    tx.create(new_account("kim@example.com")).await?;
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, StoreError>(())
                })
            }),
        )
        .await;

        assert!(result.is_err());
        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.commit_count(), 0);
    }
}
