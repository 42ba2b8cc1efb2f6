use super::subject::Subject;
use super::validation::{
    clean_optional, parse_enum, require, validate_amount, validate_email, validate_postal_code,
};
use crate::error::AppResult;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    ProfessorStatus("professor status") {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
    }
}

/// Tutor who gives the lessons
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Professor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub hourly_rate: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Professor {
    pub fn status_enum(&self) -> ProfessorStatus {
        self.status.parse().unwrap_or(ProfessorStatus::Pending)
    }

    pub fn is_active(&self) -> bool {
        self.status_enum() == ProfessorStatus::Active
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessorWithSubjects {
    #[serde(flatten)]
    pub professor: Professor,
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessorInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Replaces the professor's subjects when present
    #[serde(default)]
    pub subject_ids: Option<Vec<Uuid>>,
}

impl ProfessorInput {
    pub fn validate(&self) -> AppResult<()> {
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)?;
        validate_email("email", &self.email)?;
        if let Some(postal_code) = clean_optional(&self.postal_code) {
            validate_postal_code("postal_code", &postal_code)?;
        }
        if let Some(rate) = self.hourly_rate {
            validate_amount("hourly_rate", rate)?;
        }
        self.status()?;
        Ok(())
    }

    pub fn status(&self) -> AppResult<ProfessorStatus> {
        match clean_optional(&self.status) {
            Some(status) => parse_enum(&status),
            None => Ok(ProfessorStatus::Pending),
        }
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfessorSubjectsInput {
    pub subject_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessorFilter {
    pub subject_id: Option<Uuid>,
    pub status: Option<String>,
}

impl ProfessorFilter {
    pub fn status(&self) -> AppResult<Option<ProfessorStatus>> {
        clean_optional(&self.status).map(|s| parse_enum(&s)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProfessorInput {
        ProfessorInput {
            first_name: "Marc".to_string(),
            last_name: "Leroy".to_string(),
            email: "marc.leroy@example.fr".to_string(),
            hourly_rate: Some(Decimal::new(1800, 2)),
            ..ProfessorInput::default()
        }
    }

    #[test]
    fn test_professor_defaults_to_pending() {
        let professor = input();
        assert!(professor.validate().is_ok());
        assert_eq!(professor.status().unwrap(), ProfessorStatus::Pending);
    }

    #[test]
    fn test_professor_negative_rate() {
        let professor = ProfessorInput {
            hourly_rate: Some(Decimal::new(-500, 2)),
            ..input()
        };
        assert!(professor.validate().is_err());
    }

    #[test]
    fn test_professor_requires_email() {
        let professor = ProfessorInput {
            email: "".to_string(),
            ..input()
        };
        assert!(professor.validate().is_err());
    }
}
