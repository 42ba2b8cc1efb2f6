use super::validation::{parse_enum, require};
use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    SchoolLevel("school level") {
        Primary => "primary",
        MiddleSchool => "middle_school",
        HighSchool => "high_school",
        HigherEducation => "higher_education",
        Adult => "adult",
    }
}

/// Student model: a child (or adult learner) attached to a family
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub family_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub school_name: Option<String>,
    pub level: String, // Stored as TEXT, use SchoolLevel enum for type safety
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentInput {
    pub family_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub school_name: Option<String>,
    pub level: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl StudentInput {
    pub fn validate(&self) -> AppResult<()> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        self.level()?;
        if let Some(date_of_birth) = self.date_of_birth {
            if date_of_birth > chrono::Utc::now().date_naive() {
                return Err(AppError::Validation(
                    "date_of_birth cannot be in the future".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn level(&self) -> AppResult<SchoolLevel> {
        parse_enum(&self.level)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentFilter {
    pub family_id: Option<Uuid>,
}
