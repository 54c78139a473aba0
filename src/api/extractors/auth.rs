use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::Principal;
use crate::domain::services::auth_service::AuthService;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Capability check; authentication already happened during extraction.
    pub fn require_any(&self, roles: &[&str]) -> Result<&Principal, AppError> {
        if self.0.has_any_role(roles) {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden(format!("Requires one of the roles: {}", roles.join(", "))))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        let access_token = cookies.get(ACCESS_TOKEN_COOKIE)
            .ok_or(StatusCode::UNAUTHORIZED)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let claims = app_state.auth_service.verify(&access_token)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let method = &parts.method;
        if method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get(CSRF_HEADER)
                .ok_or(StatusCode::FORBIDDEN)?
                .to_str()
                .map_err(|_| StatusCode::FORBIDDEN)?;

            if csrf_header_val != claims.csrf_token {
                return Err(StatusCode::FORBIDDEN);
            }
        }

        let principal = AuthService::principal(&claims);
        Span::current().record("user_id", principal.user_id.as_str());

        Ok(AuthUser(principal))
    }
}
