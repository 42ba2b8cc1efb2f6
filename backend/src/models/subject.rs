use super::validation::{parse_enum, require};
use crate::error::AppResult;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    SubjectCategory("subject category") {
        Scientific => "scientific",
        Literary => "literary",
        Languages => "languages",
        Other => "other",
    }
}

/// Subject taught (mathematics, English, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectInput {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SubjectInput {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        self.category()?;
        Ok(())
    }

    pub fn category(&self) -> AppResult<SubjectCategory> {
        parse_enum(&self.category)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectFilter {
    pub active: Option<bool>,
}
