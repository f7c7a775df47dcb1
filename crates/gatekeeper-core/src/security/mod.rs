//! 자격 증명, 토큰, 접근 게이트.
//!
//! - [`CredentialHasher`]: Argon2id 비밀번호 해싱/검증
//! - [`TokenIssuer`]: HS256 토큰 발급
//! - [`TokenValidator`] / [`Authenticator`]: 서명, 만료, 클레임 검증 (인증 게이트)
//! - [`RoleGate`]: 역할 기반 접근 제어 (인가 게이트)

mod gate;
mod password;
mod token;

pub use gate::{parse_bearer, Authenticator, RoleGate, BEARER_SCHEME};
pub use password::CredentialHasher;
pub use token::{Claims, IssuedToken, TokenIssuer, TokenValidator, HMAC_ALGORITHMS};

#[cfg(test)]
pub(crate) use password::test_hasher;
#[cfg(test)]
pub(crate) use token::TEST_SECRET;
