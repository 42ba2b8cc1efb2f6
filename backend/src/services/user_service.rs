use crate::auth;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for managing back-office accounts
pub struct UserService {
    user_repo: Arc<UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.user_repo.list().await?)
    }

    pub async fn create(&self, input: NewUser) -> AppResult<User> {
        input.validate()?;
        let role = input.role()?;
        let email = input.normalized_email();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }

        let password_hash = auth::hash_password_blocking(input.password).await?;
        let user = self
            .user_repo
            .create(&email, &password_hash, &input.first_name, &input.last_name, role)
            .await?;

        info!("Created user {} ({})", user.email, user.role);
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, input: UpdateUser) -> AppResult<User> {
        input.validate()?;
        self.user_repo
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Delete an account. Users cannot delete themselves.
    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> AppResult<()> {
        if actor_id == id {
            return Err(AppError::Conflict(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.user_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        info!("Deleted user {}", id);
        Ok(())
    }
}
