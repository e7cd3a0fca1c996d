//! Axum middleware for authentication and authorization.
//!
//! Two authenticators exist because the two token kinds are signed with
//! different secrets: access tokens guard the protected routes, refresh
//! tokens are accepted only by the refresh endpoint. A separate role check
//! runs after access authentication for role-restricted routes.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, State},
    http::{header::AUTHORIZATION, Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info_span, warn};

use crate::api::error::ApiError;
use crate::auth::account::Role;
use crate::auth::token::{Claims, JwtCodec};
use crate::domain::AccountId;
use crate::errors::{AuthErrorType, Error};

pub type VerifierState = Arc<JwtCodec>;
pub type RoleState = Arc<HashSet<Role>>;

/// Identity established by a verified access token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: AccountId,
    pub email: String,
    pub role: Role,
}

/// A verified refresh token together with its raw form, which the refresh
/// handler compares against the stored value.
#[derive(Debug, Clone)]
pub struct RefreshContext {
    pub claims: Claims,
    pub token: String,
}

fn bearer_token(request: &Request<Body>) -> Result<String, Error> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(Error::auth("Authentication required", AuthErrorType::MissingToken)),
    }
}

/// Authenticate a request with an access token and attach an [`AuthContext`].
pub async fn authenticate_access(
    State(verifier): State<VerifierState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let span = info_span!(
        "auth_middleware.access",
        http.method = %request.method(),
        http.path = %request.uri().path()
    );
    let _guard = span.enter();

    let token = bearer_token(&request)?;
    let claims = verifier.verify(&token).map_err(|err| {
        warn!(error = %err, "Access token verification failed");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthContext {
        account_id: AccountId::from_string(claims.sub),
        email: claims.email,
        role: claims.role,
    });
    Ok(next.run(request).await)
}

/// Authenticate a request with a refresh token and attach a [`RefreshContext`].
pub async fn authenticate_refresh(
    State(verifier): State<VerifierState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let span = info_span!(
        "auth_middleware.refresh",
        http.method = %request.method(),
        http.path = %request.uri().path()
    );
    let _guard = span.enter();

    let token = bearer_token(&request)?;
    let claims = verifier.verify(&token).map_err(|err| {
        warn!(error = %err, "Refresh token verification failed");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(RefreshContext { claims, token });
    Ok(next.run(request).await)
}

/// Allow the request through only when the authenticated role is in the
/// route's allowed set.
pub async fn ensure_roles(
    State(allowed): State<RoleState>,
    Extension(context): Extension<AuthContext>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if allowed.contains(&context.role) {
        return Ok(next.run(request).await);
    }

    warn!(
        account_id = %context.account_id,
        role = %context.role,
        http.path = %request.uri().path(),
        "Role check failed"
    );
    Err(ApiError::forbidden("You do not have permission to access this resource"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/auth/me");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn bearer_token_requires_the_scheme() {
        assert!(bearer_token(&request_with_auth(Some("Basic abc"))).is_err());
        assert!(bearer_token(&request_with_auth(Some("Bearer "))).is_err());
        assert_eq!(bearer_token(&request_with_auth(Some("Bearer tok-123"))).unwrap(), "tok-123");
    }

    #[test]
    fn absent_header_is_a_missing_token_error() {
        let err = bearer_token(&request_with_auth(None)).unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::MissingToken, .. }
        ));
        assert_eq!(err.status_code(), 401);
    }
}
