//! OpenAPI document assembly.

use axum::Json;
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health,
        crate::api::handlers::signup,
        crate::api::handlers::login,
        crate::api::handlers::refresh_tokens,
        crate::api::handlers::me,
        crate::api::handlers::list_pending_consultants,
        crate::api::handlers::set_consultant_approval
    ),
    components(
        schemas(
            crate::auth::account::SignupRequest,
            crate::auth::account::LoginRequest,
            crate::auth::account::ApprovalDecisionRequest,
            crate::auth::account::ApprovalDecision,
            crate::auth::account::AccountResponse,
            crate::auth::account::Role,
            crate::auth::account::ApprovalState,
            crate::api::handlers::SignupResponse,
            crate::api::handlers::LoginResponse,
            crate::api::handlers::RefreshResponse,
            crate::api::handlers::MeResponse,
            crate::api::handlers::PendingConsultantsResponse,
            crate::api::error::ApiErrorBody
        )
    ),
    tags(
        (name = "auth", description = "Signup, login, token refresh, and identity lookup"),
        (name = "admin", description = "Administrator-only consultant approval workflow")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_access",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "bearer_refresh",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// Serve the assembled OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
