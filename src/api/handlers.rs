//! HTTP handlers for the auth and admin endpoints.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::api::routes::ApiState;
use crate::auth::account::{
    AccountResponse, ApprovalDecisionRequest, LoginRequest, Role, SignupRequest,
};
use crate::auth::middleware::{AuthContext, RefreshContext};
use crate::domain::AccountId;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user: AccountResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: AccountResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: AccountResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingConsultantsResponse {
    pub consultants: Vec<AccountResponse>,
}

/// Create a new account.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid request payload"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<ApiState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.auth_service.signup(payload).await?;

    // Consultants are told up front that they cannot log in yet.
    let message = match account.role {
        Role::Consultant => {
            "Account created. An administrator must approve it before you can log in."
        }
        _ => "Account created successfully",
    };

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse { message: message.to_string(), user: account.into() }),
    ))
}

/// Verify credentials and issue an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account pending administrator approval")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<ApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (account, pair) = state.auth_service.login(payload).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: account.into(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Exchange a valid refresh token for a fresh token pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens rotated", body = RefreshResponse),
        (status = 401, description = "Invalid, expired, or superseded refresh token")
    ),
    security(("bearer_refresh" = [])),
    tag = "auth"
)]
pub async fn refresh_tokens(
    State(state): State<ApiState>,
    Extension(context): Extension<RefreshContext>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let pair = state.auth_service.refresh(&context.claims, &context.token).await?;

    Ok(Json(RefreshResponse {
        message: "Tokens refreshed".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Return the account behind the presented access token.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer_access" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<MeResponse>, ApiError> {
    let account = state.auth_service.me(&context.account_id).await?;
    Ok(Json(MeResponse { user: account.into() }))
}

/// List consultants awaiting an approval decision. Admin only.
#[utoipa::path(
    get,
    path = "/admin/consultants/pending",
    responses(
        (status = 200, description = "Pending consultants", body = PendingConsultantsResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("bearer_access" = [])),
    tag = "admin"
)]
pub async fn list_pending_consultants(
    State(state): State<ApiState>,
) -> Result<Json<PendingConsultantsResponse>, ApiError> {
    let consultants = state
        .auth_service
        .list_pending_consultants()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(PendingConsultantsResponse { consultants }))
}

/// Approve or reject a pending consultant. Admin only.
#[utoipa::path(
    patch,
    path = "/admin/consultants/{id}/approval",
    params(("id" = String, Path, description = "Consultant account id")),
    request_body = ApprovalDecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = MeResponse),
        (status = 400, description = "Account is not a consultant"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_access" = [])),
    tag = "admin"
)]
pub async fn set_consultant_approval(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<ApprovalDecisionRequest>,
) -> Result<Json<MeResponse>, ApiError> {
    let id = AccountId::from_string(id);
    let account = state.auth_service.set_consultant_approval(&id, payload.state.into()).await?;

    Ok(Json(MeResponse { user: account.into() }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is live")),
    tag = "auth"
)]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
