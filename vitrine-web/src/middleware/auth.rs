//! JWT bearer authentication middleware
//!
//! Resolves the caller to a user context or `anonymous`; rejection happens
//! later, at the route's role guard, not here.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::WebError;
use vitrine_api_types::UserRole;
use vitrine_config::AuthConfig;

/// JWT claims carried by a bearer token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    /// Subject (user id)
    pub sub: String,
    /// Login name
    pub login: String,
    /// Role: admin | user | service
    pub role: String,
    /// Linked host company, if any
    pub company_id: Option<i32>,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Authentication context for the current request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Option<i32>,
    pub login: String,
    pub role: UserRole,
    pub company_id: Option<i32>,
    pub is_authenticated: bool,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self {
            user_id: None,
            login: "anonymous".to_string(),
            role: UserRole::Guest,
            company_id: None,
            is_authenticated: false,
        }
    }
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.is_authenticated && self.role == UserRole::Admin
    }

    /// Internal service callers are the only ones trusted with the
    /// tenant-code header
    pub fn is_internal_service(&self) -> bool {
        self.is_authenticated && self.role == UserRole::Service
    }

    pub fn require_authenticated(&self) -> Result<(), WebError> {
        if !self.is_authenticated {
            return Err(WebError::auth_required());
        }
        Ok(())
    }

    pub fn require_admin(&self) -> Result<(), WebError> {
        self.require_authenticated()?;
        if !self.is_admin() {
            return Err(WebError::forbidden("platform admin role required"));
        }
        Ok(())
    }
}

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for a principal
    pub fn generate_token(
        &self,
        user_id: i32,
        login: &str,
        role: UserRole,
        company_id: Option<i32>,
    ) -> Result<String, WebError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            login: login.to_string(),
            role: role.as_str().to_string(),
            company_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.token_expiry_hours)).timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| WebError::internal(format!("token generation failed: {e}")))
    }

    /// Verify a token and build the auth context
    pub fn verify_token(&self, token: &str) -> Option<AuthContext> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let claims = match decode::<JwtClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                return None;
            }
        };

        let role = match claims.role.as_str() {
            "admin" => UserRole::Admin,
            "user" => UserRole::User,
            "service" => UserRole::Service,
            _ => UserRole::Guest,
        };

        Some(AuthContext {
            user_id: claims.sub.parse().ok(),
            login: claims.login,
            role,
            company_id: claims.company_id,
            is_authenticated: true,
        })
    }

    /// Login of the platform super-user
    pub fn superuser_login(&self) -> &str {
        &self.config.superuser_login
    }
}

/// Shared state for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtManager>,
}

/// Parse the bearer token into an `AuthContext` extension; anonymous when
/// absent or invalid
pub async fn auth_middleware(State(state): State<AuthState>, mut request: Request, next: Next) -> Response {
    let context = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(|token| state.jwt.verify_token(token))
        .unwrap_or_default();

    request.extensions_mut().insert(Arc::new(context));
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Arc<AuthContext>>()
            .map(|ctx| ctx.as_ref().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new(AuthConfig::default())
    }

    #[test]
    fn test_token_roundtrip() {
        let jwt = manager();
        let token = jwt.generate_token(7, "alex", UserRole::Admin, Some(3)).unwrap();
        let ctx = jwt.verify_token(&token).unwrap();
        assert_eq!(ctx.user_id, Some(7));
        assert_eq!(ctx.login, "alex");
        assert!(ctx.is_admin());
        assert_eq!(ctx.company_id, Some(3));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let jwt = manager();
        let token = jwt.generate_token(7, "alex", UserRole::User, None).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(jwt.verify_token(&tampered).is_none());
    }

    #[test]
    fn test_role_guards() {
        let anonymous = AuthContext::default();
        assert!(anonymous.require_authenticated().is_err());

        let jwt = manager();
        let token = jwt.generate_token(1, "u", UserRole::User, None).unwrap();
        let user = jwt.verify_token(&token).unwrap();
        assert!(user.require_authenticated().is_ok());
        assert!(user.require_admin().is_err());
        assert!(!user.is_internal_service());
    }
}
