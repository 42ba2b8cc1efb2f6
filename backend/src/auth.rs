//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the user id, email and role. The
//! middleware validates the `Authorization: Bearer <token>` header, reloads
//! the account it names and stores [`Claims`] reflecting the account's
//! current email and role in the request extensions for handlers.

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::{User, UserRole};
use crate::AppState;
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiration (unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Same token lifetime, identity taken from the stored account
    pub fn refreshed(self, user: &User) -> Self {
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role_enum(),
            ..self
        }
    }
}

/// Signing and verification keys derived from the configured secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiration_secs: u64,
}

impl JwtKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::default(),
            expiration_secs: config.jwt_expiration_secs,
        }
    }

    pub fn expiration_secs(&self) -> u64 {
        self.expiration_secs
    }

    /// Sign a token for `user`, valid for the configured lifetime
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role_enum(),
            iat: now,
            exp: now + self.expiration_secs as i64,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Message(format!("Failed to encode JWT: {}", e)))
    }

    /// Validate signature and expiry
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

/// Hash a plain password with argon2id
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Message(format!("Failed to hash password: {}", e)))
}

/// Verify a password against an argon2id hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`hash_password`] on the blocking thread pool
pub async fn hash_password_blocking(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Message(format!("Password hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Message(format!("Password verification task failed: {}", e)))
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Require a valid bearer token for an existing, active account.
/// Deleted accounts get 401 and disabled ones 403, even with an unexpired token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let claims = state.jwt.verify(token)?;
    let user = state.auth_service.current_user(&claims).await?;
    request.extensions_mut().insert(claims.refreshed(&user));

    Ok(next.run(request).await)
}

/// Route layer for admin-only routers. Must run inside [`require_auth`].
pub async fn admin_only(request: Request, next: Next) -> Result<Response, AppError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;
    require_admin(claims)?;

    Ok(next.run(request).await)
}

/// Reject non-admin callers with 403
pub fn require_admin(claims: &Claims) -> AppResult<()> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This action requires the admin role".to_string(),
        ))
    }
}
