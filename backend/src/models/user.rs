use super::validation::{clean_optional, parse_enum, require, validate_email};
use crate::error::{AppError, AppResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

text_enum! {
    /// Back-office role
    UserRole("role") {
        Admin => "admin",
        Staff => "staff",
    }
}

/// Back-office account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String, // Stored as TEXT, use UserRole enum for type safety
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Get role as an enum
    pub fn role_enum(&self) -> UserRole {
        self.role.parse().unwrap_or(UserRole::Staff)
    }

    pub fn is_admin(&self) -> bool {
        self.role_enum() == UserRole::Admin
    }
}

/// Payload for creating an account
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> AppResult<()> {
        validate_email("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        self.role()?;
        Ok(())
    }

    /// Emails are compared case-insensitively, so they are stored lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn role(&self) -> AppResult<UserRole> {
        match clean_optional(&self.role) {
            Some(role) => parse_enum(&role),
            None => Ok(UserRole::Staff),
        }
    }
}

/// Partial update of an account (admin only)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(first_name) = &self.first_name {
            require("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            require("last_name", last_name)?;
        }
        if let Some(role) = &self.role {
            parse_enum::<UserRole>(role)?;
        }
        Ok(())
    }
}
