//! PostgreSQL 저장소.
//!
//! 코어의 [`TransactionSource`](gatekeeper_core::TransactionSource)와
//! [`AccountRepository`](gatekeeper_core::AccountRepository)를 sqlx로 구현합니다.

pub mod accounts;

pub use accounts::{AccountRecord, PgStore, PgTransaction};
