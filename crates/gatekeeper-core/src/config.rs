//! 설정 관리.
//!
//! 기본값 → `config/default.toml`(선택) → `GATEKEEPER__*` 환경 변수 순서로 병합합니다.
//! `JWT_SECRET`, `DATABASE_URL` 환경 변수도 그대로 인식합니다.

use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// 애플리케이션 설정.
///
/// 프로세스 시작 후에는 읽기 전용입니다.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 토큰 설정
    pub auth: AuthConfig,
    /// 비밀번호 해싱 설정
    pub password: PasswordConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 연결 URL
    pub url: String,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// `true`면 PostgreSQL 대신 메모리 저장소 사용 (로컬 실행용, 재시작 시 초기화)
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/gatekeeper".to_string(),
            max_connections: 10,
            connection_timeout_secs: 30,
            in_memory: false,
        }
    }
}

/// 토큰 유효 시간 상한 (1년).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

/// 토큰 발급/검증 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC 서명 키. 로그에는 노출되지 않습니다.
    #[serde(deserialize_with = "deserialize_secret")]
    pub jwt_secret: Option<SecretString>,
    /// 토큰 유효 시간 (시간)
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
        }
    }
}

impl AuthConfig {
    /// 서명 키가 설정되어 있고 비어 있지 않은지 확인.
    pub fn has_secret(&self) -> bool {
        self.jwt_secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().trim().is_empty())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Argon2id 파라미터.
///
/// 기본값은 argon2 크레이트의 권장값(m=19456 KiB, t=2, p=1)입니다.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아니지만, 서명 키가 없으면 에러입니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("GATEKEEPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?;

        Self::from_builder(builder)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }

    /// 임의의 소스 조합에서 설정을 만들고 검증합니다.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 치명적인 설정 오류 검사.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.auth.has_secret() {
            return Err(ConfigError::Message(
                "auth.jwt_secret (JWT_SECRET) is not configured".to_string(),
            ));
        }
        if self.auth.token_ttl_hours <= 0 || self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(toml: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_load_with_defaults() {
        let config = from_toml(
            r#"
            [auth]
            jwt_secret = "unit-test-secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.password.iterations, 2);
        assert_eq!(config.logging.format, "pretty");
        assert!(!config.database.in_memory);
        assert_eq!(
            config.auth.jwt_secret.as_ref().unwrap().expose_secret(),
            "unit-test-secret"
        );
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let result = from_toml(
            r#"
            [server]
            port = 8080
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_secret_is_fatal() {
        let result = from_toml(
            r#"
            [auth]
            jwt_secret = "   "
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = from_toml(
            r#"
            [auth]
            jwt_secret = "do-not-print-me"
            "#,
        )
        .unwrap();

        let debug = format!("{:?}", config.auth);
        assert!(!debug.contains("do-not-print-me"));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let result = from_toml(
            r#"
            [auth]
            jwt_secret = "secret"
            token_ttl_hours = 0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let result = from_toml(
            r#"
            [auth]
            jwt_secret = "secret"
            token_ttl_hours = 9000000000000000
            "#,
        );
        assert!(result.is_err());

        let at_limit = from_toml(&format!(
            "[auth]\njwt_secret = \"secret\"\ntoken_ttl_hours = {}\n",
            MAX_TOKEN_TTL_HOURS
        ));
        assert!(at_limit.is_ok());
    }
}
