use super::student::Student;
use super::validation::{clean_optional, parse_enum, require, validate_email, validate_postal_code};
use crate::error::AppResult;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Lifecycle of a family: a client owns at least one settlement note.
    FamilyStatus("family status") {
        Prospect => "prospect",
        Client => "client",
    }
}

impl FamilyStatus {
    /// Status implied by the number of settlement notes a family owns.
    pub fn from_settlement_note_count(count: i64) -> Self {
        if count > 0 {
            FamilyStatus::Client
        } else {
            FamilyStatus::Prospect
        }
    }
}

text_enum! {
    /// Follow-up stage of a prospect
    ProspectStatus("prospect status") {
        ToCall => "to_call",
        Thinking => "thinking",
        Interested => "interested",
        AppointmentScheduled => "appointment_scheduled",
        NotRelevant => "not_relevant",
    }
}

/// Family model: the paying household, either prospect or client
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Family {
    pub id: Uuid,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: String,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub status: String, // Stored as TEXT, use FamilyStatus enum for type safety
    pub prospect_status: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub next_action_date: Option<NaiveDate>,
    pub next_action_note: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Family {
    /// Get status as an enum
    pub fn status_enum(&self) -> FamilyStatus {
        self.status.parse().unwrap_or(FamilyStatus::Prospect)
    }

    /// Name printed on settlement notes
    pub fn client_name(&self) -> String {
        format!(
            "{} {}",
            self.contact_first_name.trim(),
            self.contact_last_name.trim().to_uppercase()
        )
    }

    pub fn department(&self) -> Option<String> {
        self.postal_code.as_deref().and_then(department_from_postal_code)
    }
}

/// French department code from a postal code: two digits in mainland
/// France, `2A`/`2B` for Corsica, three digits overseas.
pub fn department_from_postal_code(postal_code: &str) -> Option<String> {
    let code = postal_code.trim();
    if code.len() != 5 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let department = match &code[..2] {
        "97" | "98" => code[..3].to_string(),
        "20" => {
            if code < "20200" {
                "2A".to_string()
            } else {
                "2B".to_string()
            }
        }
        prefix => prefix.to_string(),
    };
    Some(department)
}

/// Family with its students, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct FamilyDetail {
    #[serde(flatten)]
    pub family: Family,
    pub students: Vec<Student>,
    pub settlement_note_count: i64,
}

/// Create/replace payload. There is no `status` field: it only
/// changes through settlement notes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyInput {
    pub contact_first_name: String,
    pub contact_last_name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    pub contact_phone: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub prospect_status: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FamilyInput {
    pub fn validate(&self) -> AppResult<()> {
        require("contact_first_name", &self.contact_first_name)?;
        require("contact_last_name", &self.contact_last_name)?;
        require("contact_phone", &self.contact_phone)?;
        if let Some(email) = clean_optional(&self.contact_email) {
            validate_email("contact_email", &email)?;
        }
        if let Some(postal_code) = clean_optional(&self.postal_code) {
            validate_postal_code("postal_code", &postal_code)?;
        }
        self.prospect_status()?;
        Ok(())
    }

    pub fn prospect_status(&self) -> AppResult<Option<ProspectStatus>> {
        clean_optional(&self.prospect_status)
            .map(|s| parse_enum(&s))
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyFilter {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl FamilyFilter {
    pub fn status(&self) -> AppResult<Option<FamilyStatus>> {
        clean_optional(&self.status).map(|s| parse_enum(&s)).transpose()
    }

    pub fn search(&self) -> Option<String> {
        clean_optional(&self.search)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProspectStatusInput {
    pub prospect_status: Option<String>,
}

impl ProspectStatusInput {
    pub fn prospect_status(&self) -> AppResult<Option<ProspectStatus>> {
        clean_optional(&self.prospect_status)
            .map(|s| parse_enum(&s))
            .transpose()
    }
}

/// Reminder to call a prospect back. Both fields `None` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextActionInput {
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}
