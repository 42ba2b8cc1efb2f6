use crate::auth::{self, Claims, JwtKeys};
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};
use crate::models::validation::validate_email;
use crate::models::{User, UserRole};
use crate::repositories::UserRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

/// Service for logging in and resolving the current user
pub struct AuthService {
    user_repo: Arc<UserRepository>,
    jwt: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(user_repo: Arc<UserRepository>, jwt: Arc<JwtKeys>) -> Self {
        Self { user_repo, jwt }
    }

    /// Check the credentials and issue an access token. Unknown email and
    /// wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            warn!("Login attempt for unknown account {}", email);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let valid =
            auth::verify_password_blocking(request.password, user.password_hash.clone()).await?;
        if !valid {
            warn!("Failed login for {}", email);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        let access_token = self.jwt.issue(&user)?;
        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiration_secs(),
            user,
        })
    }

    /// The account behind a validated token
    pub async fn current_user(&self, claims: &Claims) -> AppResult<User> {
        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        Ok(user)
    }

    /// Create the first admin account when the users table is empty.
    /// Returns the created user, or `None` when accounts already exist.
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> AppResult<Option<User>> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }

        let email = admin.email.trim().to_lowercase();
        validate_email("BOOTSTRAP_ADMIN_EMAIL", &email)?;
        if admin.password.len() < 8 {
            return Err(AppError::Config(
                "BOOTSTRAP_ADMIN_PASSWORD must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = auth::hash_password_blocking(admin.password.clone()).await?;
        let user = self
            .user_repo
            .create(&email, &password_hash, "Admin", "ABC Cours", UserRole::Admin)
            .await?;

        info!("Bootstrap admin {} created", user.email);
        Ok(Some(user))
    }
}
