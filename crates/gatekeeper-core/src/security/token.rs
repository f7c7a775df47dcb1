//! JWT 발급 및 검증.
//!
//! HMAC 계열(HS256/HS384/HS512)만 허용하며, 헤더의 `alg` 값은 검증 전에 명시적으로 확인합니다.
//! 토큰은 서버에 저장되지 않고 서명과 클레임만으로 판정됩니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::{Principal, Role};
use crate::error::TokenError;

/// 허용되는 서명 알고리즘.
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 계정 ID
    #[serde(default)]
    pub sub: String,
    /// 계정 역할
    #[serde(default)]
    pub role: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// 발급된 토큰.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// 항상 "Bearer"
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

fn require_secret(secret: Option<&SecretString>) -> Result<&[u8], TokenError> {
    let secret = secret.ok_or(TokenError::MissingSecret)?.expose_secret();
    if secret.trim().is_empty() {
        return Err(TokenError::MissingSecret);
    }
    Ok(secret.as_bytes())
}

/// 토큰 발급기.
///
/// 만료 시각은 발급 시 고정되며 연장되지 않습니다.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SecretString, ttl: Duration) -> Result<Self, TokenError> {
        let key = EncodingKey::from_secret(require_secret(Some(secret))?);
        Ok(Self { key, ttl })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        let key = EncodingKey::from_secret(require_secret(config.jwt_secret.as_ref())?);
        let ttl = Duration::try_hours(config.token_ttl_hours).ok_or_else(|| {
            TokenError::Signing(format!(
                "token ttl of {} hours is out of range",
                config.token_ttl_hours
            ))
        })?;
        Ok(Self { key, ttl })
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, role, Utc::now())
    }

    /// 지정한 시각을 발급 시각으로 사용해 토큰 발급.
    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry is out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            role: role.as_str().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }
}

/// 토큰 검증기.
///
/// 순수 계산만 수행하며 I/O나 대기가 없습니다.
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        Ok(Self::with_key(DecodingKey::from_secret(require_secret(
            Some(secret),
        )?)))
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        Ok(Self::with_key(DecodingKey::from_secret(require_secret(
            config.jwt_secret.as_ref(),
        )?)))
    }

    fn with_key(key: DecodingKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // 만료는 호출자가 넘긴 시각으로 직접 판정
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Self { key, validation }
    }

    /// 토큰 검증 후 요청 주체 복원.
    ///
    /// 검사 순서: 알고리즘 → 서명 → 만료 → 클레임.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::InvalidSignature)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::InvalidSignature);
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => {
                    TokenError::InvalidClaims
                }
                _ => TokenError::InvalidSignature,
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        if claims.sub.trim().is_empty() || claims.role.is_empty() || claims.exp <= claims.iat {
            return Err(TokenError::InvalidClaims);
        }

        let role = Role::parse(&claims.role).ok_or(TokenError::InvalidClaims)?;

        Ok(Principal::new(claims.sub, role))
    }
}

#[cfg(test)]
pub(crate) const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";
