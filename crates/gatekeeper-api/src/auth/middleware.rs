//! Axum용 인증/역할 미들웨어와 추출기.
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/", get(list_users))
//!     .route_layer(middleware::from_fn_with_state(RoleGate::admin_only(), require_role))
//!     .route_layer(middleware::from_fn_with_state(authenticator, require_auth))
//! ```
//!
//! `route_layer`는 나중에 추가한 것이 먼저 실행되므로 인증 게이트를 마지막에 붙입니다.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use gatekeeper_core::{AccessError, Authenticator, Principal, RoleGate, TokenError};

use crate::error::ApiError;

/// 인증 게이트 미들웨어.
///
/// 성공하면 [`Principal`]을 요청 extensions에 넣고 다음 단계로 넘깁니다.
pub async fn require_auth(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| TokenError::MalformedHeader)?),
        None => None,
    };

    let principal = authenticator.authenticate(header, Utc::now())?;
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// 역할 게이트 미들웨어. [`require_auth`] 뒤에서 실행되어야 합니다.
pub async fn require_role(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate.check(request.extensions().get::<Principal>())?;
    Ok(next.run(request).await)
}

/// 인증된 요청 주체 추출기.
///
/// 인증 게이트가 적용되지 않은 라우트에서 사용하면 서버 구성 오류(500)입니다.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| {
                tracing::error!("Handler requires a principal but no authentication gate ran");
                ApiError::Access(AccessError::MissingRoleContext)
            })
    }
}
