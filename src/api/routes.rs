//! Router assembly.
//!
//! Role requirements are declared here, at route registration, rather than
//! inside handlers: the admin group carries its allowed-role set as layer
//! state, so adding a role-restricted route is a one-line change.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{docs, handlers};
use crate::auth::account::Role;
use crate::auth::middleware::{
    authenticate_access, authenticate_refresh, ensure_roles, RoleState, VerifierState,
};
use crate::auth::AuthService;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct ApiState {
    pub auth_service: AuthService,
}

pub fn build_router(state: ApiState) -> Router {
    let access_verifier: VerifierState =
        Arc::new(state.auth_service.token_issuer().access_codec());
    let refresh_verifier: VerifierState =
        Arc::new(state.auth_service.token_issuer().refresh_codec());
    let admin_only: RoleState = Arc::new(HashSet::from([Role::Admin]));

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login));

    // The refresh endpoint is the only route authenticated with the refresh
    // verifier; access tokens fail here because the secrets differ.
    let refresh = Router::new()
        .route("/auth/refresh", post(handlers::refresh_tokens))
        .layer(middleware::from_fn_with_state(refresh_verifier, authenticate_refresh));

    let admin = Router::new()
        .route("/admin/consultants/pending", get(handlers::list_pending_consultants))
        .route("/admin/consultants/{id}/approval", patch(handlers::set_consultant_approval))
        .layer(middleware::from_fn_with_state(admin_only, ensure_roles));

    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .merge(admin)
        .layer(middleware::from_fn_with_state(access_verifier, authenticate_access));

    Router::new()
        .merge(public)
        .merge(refresh)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
