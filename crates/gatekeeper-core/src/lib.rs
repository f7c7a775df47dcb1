//! # Gatekeeper Core
//!
//! 계정 서비스의 인증/인가 파이프라인과 트랜잭션 작업 단위를 제공합니다.
//!
//! - 비밀번호 해싱 (Argon2id)
//! - 토큰 발급/검증 (HMAC JWT)
//! - 인증 게이트, 역할 게이트
//! - 계정 저장소 추상화와 작업 단위(Unit of Work)
//! - 인증/계정 서비스
//! - 설정 관리, 로깅 인프라
//!
//! HTTP 경계와 PostgreSQL 구현은 `gatekeeper-api` 크레이트에 있습니다.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod security;
pub mod service;
pub mod store;

pub use crate::config::{
    AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, PasswordConfig, ServerConfig,
};
pub use domain::*;
pub use error::*;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use security::{
    parse_bearer, Authenticator, Claims, CredentialHasher, IssuedToken, RoleGate, TokenIssuer,
    TokenValidator,
};
pub use service::{AccountChanges, AccountService, AuthService, CreateAccount};
pub use store::{
    AccountRepository, MemoryStore, StoreResult, Transaction, TransactionSource, UnitOfWork,
};
