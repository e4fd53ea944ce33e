use crate::domains::auth::{Claims, TokenVerifier};
use crate::server::error::ApiError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Authenticated user information from the identity token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub username: Option<String>,
    pub groups: Vec<String>,
}

impl AuthUser {
    /// Owner identity for jobs: email, else the pool username, else sub.
    pub fn author(&self) -> &str {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.sub)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.groups.iter().any(|g| g == role))
    }

    /// 403 unless the user is in at least one of `roles`.
    pub fn require_roles(&self, roles: &[&str]) -> Result<(), ApiError> {
        if self.has_any_role(roles) {
            Ok(())
        } else {
            debug!(sub = %self.sub, required = ?roles, "Access forbidden");
            Err(ApiError::Forbidden)
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            sub: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            username: claims.username,
            groups: claims.groups,
        }
    }
}

/// JWT authentication middleware
///
/// Verifies the bearer token, if any, and adds AuthUser to request extensions.
/// Requests without a valid token continue unauthenticated; handlers that need
/// a user reject them through the `AuthUser` extractor.
pub async fn jwt_auth_middleware(
    verifier: Arc<dyn TokenVerifier>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match verifier.verify(&token).await {
            Ok(claims) => {
                let user = AuthUser::from(claims);
                debug!(sub = %user.sub, groups = ?user.groups, "Authenticated user");
                request.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Rejected bearer token"),
        }
    }

    next.run(request).await
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}
