//! 요청 추출기.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// JSON 본문을 역직렬화한 뒤 `validator` 규칙을 검사하는 추출기.
///
/// 형식 오류와 검증 실패는 모두 400 `VALIDATION_ERROR`입니다.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::BadRequest(validation_message(&errors)))?;

        Ok(Self(value))
    }
}

/// 필드별 검증 에러를 한 줄 메시지로 합칩니다.
fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// 경로의 계정 ID 파싱.
pub fn parse_account_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("유효하지 않은 계정 ID: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Probe {
        #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
        email: String,
        #[validate(length(min = 6))]
        password: String,
    }

    #[test]
    fn test_validation_message_collects_fields() {
        let probe = Probe {
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        };
        let message = validation_message(&probe.validate().unwrap_err());

        assert!(message.contains("이메일 형식이 올바르지 않습니다"));
        assert!(message.contains("password: 유효하지 않은 값"));
    }

    #[test]
    fn test_parse_account_id() {
        assert!(parse_account_id("0b7e6d3c-8d8a-4f0e-9d55-6f1d0f1b2a11").is_ok());
        assert!(matches!(
            parse_account_id("42"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
