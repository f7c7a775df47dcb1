//! 비밀번호 해싱.
//!
//! Argon2id 기반. 솔트는 호출마다 새로 생성되므로 같은 입력도 매번 다른 해시가 나오며,
//! 검증은 해시에 포함된 솔트와 파라미터를 사용합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::domain::PasswordDigest;
use crate::error::PasswordError;

/// 비밀번호 해셔.
///
/// 설정에서 한 번 만들어 `Arc`로 공유합니다.
/// Argon2 연산은 `spawn_blocking`으로 블로킹 스레드 풀에서 실행합니다.
pub struct CredentialHasher {
    params: Params,
    /// 존재하지 않는 계정 로그인 시 비교용 해시 (응답 시간 균일화)
    dummy: PasswordDigest,
}

impl CredentialHasher {
    /// Argon2id 파라미터로 해셔 생성.
    ///
    /// 비교용 해시를 한 번 계산하므로 시작 시점에 호출합니다.
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        let dummy = hash_with(&argon2(&params), "gatekeeper-timing-equalizer")?;
        Ok(Self { params, dummy })
    }

    /// 비밀번호 해싱.
    ///
    /// # Returns
    ///
    /// PHC 형식 다이제스트 (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
    pub async fn hash(&self, plaintext: &str) -> Result<PasswordDigest, PasswordError> {
        let argon2 = argon2(&self.params);
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || hash_with(&argon2, &plaintext))
            .await
            .map_err(|e| PasswordError::HashingFailed(format!("Task join error: {}", e)))?
    }

    /// 비밀번호 검증.
    ///
    /// 불일치는 정상적인 결과이므로 `Ok(false)`를 반환합니다.
    /// 해시 형식이 손상된 경우에도 `Ok(false)`이며 경고를 남깁니다.
    pub async fn verify(
        &self,
        plaintext: &str,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordError> {
        let argon2 = argon2(&self.params);
        let plaintext = plaintext.to_string();
        let digest = digest.clone();

        tokio::task::spawn_blocking(move || verify_with(&argon2, &plaintext, &digest))
            .await
            .map_err(|e| PasswordError::HashingFailed(format!("Task join error: {}", e)))
    }

    /// 계정이 없을 때도 같은 비용의 검증을 수행합니다. 항상 `false`.
    pub async fn verify_dummy(&self, plaintext: &str) -> Result<bool, PasswordError> {
        self.verify(plaintext, &self.dummy).await?;
        Ok(false)
    }
}

fn argon2(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<PasswordDigest, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(PasswordDigest::new(hash.to_string()))
}

fn verify_with(argon2: &Argon2<'_>, plaintext: &str, digest: &PasswordDigest) -> bool {
    let parsed = match PasswordHash::new(digest.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password digest is not valid PHC");
            return false;
        }
    };

    argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&PasswordConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
