//! 계정 관리 endpoint.
//!
//! - `/me`: 인증만 필요
//! - 나머지: 인증 + `admin` 역할

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use gatekeeper_core::{
    Account, AccountChanges, Authenticator, CreateAccount, Role, RoleGate, TransactionSource,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{require_auth, require_role, CurrentPrincipal};
use crate::error::ApiResult;
use crate::extract::{parse_account_id, ValidatedJson};
use crate::state::AppState;

/// 계정 응답. 비밀번호 해시는 포함하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub is_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
            role: account.role,
            is_verified: account.is_verified,
            last_login_at: account.last_login_at,
            created_at: account.created_at,
        }
    }
}

/// 단순 메시지 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// 관리자 계정 생성 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,
    #[validate(length(min = 1, message = "비밀번호는 필수입니다"))]
    pub password: String,
    #[validate(length(min = 1, message = "이름은 필수입니다"))]
    pub display_name: String,
    /// 생략 시 `user`
    #[serde(default)]
    pub role: Option<Role>,
}

impl From<CreateAccountRequest> for CreateAccount {
    fn from(request: CreateAccountRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
            display_name: request.display_name,
            role: request.role,
        }
    }
}

/// 계정 갱신 요청. 생략한 필드는 유지됩니다.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "비밀번호는 6자 이상이어야 합니다"))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "이름은 비어 있을 수 없습니다"))]
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

impl From<UpdateAccountRequest> for AccountChanges {
    fn from(request: UpdateAccountRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
            display_name: request.display_name,
            role: request.role,
        }
    }
}

/// GET /api/v1/users
pub async fn list_users<S: TransactionSource>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let accounts = state.accounts.find_all().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/users
pub async fn create_user<S: TransactionSource>(
    State(state): State<AppState<S>>,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let account = state.accounts.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /api/v1/users/{id}
pub async fn get_user<S: TransactionSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.accounts.find_by_id(parse_account_id(&id)?).await?;
    Ok(Json(account.into()))
}

/// PUT /api/v1/users/{id}
pub async fn update_user<S: TransactionSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let id = parse_account_id(&id)?;
    let account = state.accounts.update(id, request.into()).await?;
    Ok(Json(account.into()))
}

/// DELETE /api/v1/users/{id}
pub async fn delete_user<S: TransactionSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.accounts.delete(parse_account_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "계정이 삭제되었습니다".to_string(),
    }))
}

/// GET /api/v1/users/me
pub async fn get_me<S: TransactionSource>(
    State(state): State<AppState<S>>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.accounts.me(&principal).await?;
    Ok(Json(account.into()))
}

/// PUT /api/v1/users/me
///
/// 역할 필드가 포함되면 403입니다.
pub async fn update_me<S: TransactionSource>(
    State(state): State<AppState<S>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ValidatedJson(request): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.accounts.update_me(&principal, request.into()).await?;
    Ok(Json(account.into()))
}

/// 계정 라우터 생성.
///
/// 인증 게이트는 모든 라우트에, 역할 게이트는 관리자 라우트에만 적용됩니다.
pub fn users_router<S: TransactionSource>(
    authenticator: Arc<Authenticator>,
) -> Router<AppState<S>> {
    let admin = Router::new()
        .route("/", get(list_users::<S>).post(create_user::<S>))
        .route(
            "/{id}",
            get(get_user::<S>)
                .put(update_user::<S>)
                .delete(delete_user::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            RoleGate::admin_only(),
            require_role,
        ));

    Router::new()
        .route("/me", get(get_me::<S>).put(update_me::<S>))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(authenticator, require_auth))
}
