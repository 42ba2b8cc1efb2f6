//! Settlement notes ("NDR", note de règlement): what a family pays for a
//! block of lessons, and what the agency owes the professor.

use super::validation::{clean_optional, parse_enum, validate_amount};
use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// Upper bound on lesson hours per note; one coupon is issued per hour.
pub const MAX_QUANTITY: i32 = 200;

text_enum! {
    PaymentMethod("payment method") {
        Card => "card",
        Check => "check",
        Transfer => "transfer",
        Cash => "cash",
        Cesu => "cesu",
    }
}

text_enum! {
    /// Whether the family benefits from the immediate tax-credit advance
    PaymentType("payment type") {
        ImmediateAdvance => "immediate_advance",
        TaxCredit => "tax_credit",
    }
}

text_enum! {
    SettlementNoteStatus("settlement note status") {
        Pending => "pending",
        Paid => "paid",
        Overdue => "overdue",
    }
}

/// Amounts derived from the rates and the number of hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFinancials {
    pub total_amount: Decimal,
    pub salary_to_pay: Decimal,
    pub charges_to_pay: Decimal,
    pub margin_amount: Decimal,
    pub margin_percentage: Decimal,
}

impl NoteFinancials {
    /// `total = rate × hours`, `salary = professor_salary × hours`,
    /// `charges = charges × hours`, margin is what remains, and its
    /// percentage of the total is rounded to two decimals (0 when the
    /// total is 0). Fails with a validation error instead of overflowing.
    pub fn compute(
        hourly_rate: Decimal,
        quantity: i32,
        professor_salary: Decimal,
        charges: Decimal,
    ) -> AppResult<Self> {
        let out_of_range =
            || AppError::Validation("Settlement note amounts are out of range".to_string());

        let hours = Decimal::from(quantity);
        let total_amount = hourly_rate.checked_mul(hours).ok_or_else(out_of_range)?;
        let salary_to_pay = professor_salary.checked_mul(hours).ok_or_else(out_of_range)?;
        let charges_to_pay = charges.checked_mul(hours).ok_or_else(out_of_range)?;
        let margin_amount = total_amount
            .checked_sub(salary_to_pay)
            .and_then(|m| m.checked_sub(charges_to_pay))
            .ok_or_else(out_of_range)?;
        let margin_percentage = if total_amount.is_zero() {
            Decimal::ZERO
        } else {
            margin_amount
                .checked_div(total_amount)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or_else(out_of_range)?
                .round_dp(2)
        };

        Ok(Self {
            total_amount: total_amount.round_dp(2),
            salary_to_pay: salary_to_pay.round_dp(2),
            charges_to_pay: charges_to_pay.round_dp(2),
            margin_amount: margin_amount.round_dp(2),
            margin_percentage,
        })
    }
}

/// Settlement note row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettlementNote {
    pub id: Uuid,
    pub number: String,
    pub family_id: Uuid,
    pub client_name: String,
    pub department: String,
    pub payment_method: String,
    pub payment_type: String,
    pub subject_id: Uuid,
    pub professor_id: Option<Uuid>,
    pub hourly_rate: Decimal,
    pub quantity: i32,
    pub professor_salary: Decimal,
    pub charges: Decimal,
    pub total_amount: Decimal,
    pub salary_to_pay: Decimal,
    pub charges_to_pay: Decimal,
    pub margin_amount: Decimal,
    pub margin_percentage: Decimal,
    pub status: String, // Stored as TEXT, use SettlementNoteStatus enum for type safety
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SettlementNote {
    pub fn status_enum(&self) -> SettlementNoteStatus {
        self.status.parse().unwrap_or(SettlementNoteStatus::Pending)
    }

    pub fn is_paid(&self) -> bool {
        self.status_enum() == SettlementNoteStatus::Paid
    }
}

/// Human-readable note number, e.g. `NDR-2025-000042`.
pub fn format_note_number(year: i32, sequence: i64) -> String {
    format!("NDR-{}-{:06}", year, sequence)
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementNoteDetail {
    #[serde(flatten)]
    pub note: SettlementNote,
    pub student_ids: Vec<Uuid>,
    pub coupon_series_id: Option<Uuid>,
}

/// Creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewSettlementNote {
    pub family_id: Uuid,
    pub subject_id: Uuid,
    #[serde(default)]
    pub professor_id: Option<Uuid>,
    pub student_ids: Vec<Uuid>,
    /// Derived from the family postal code when omitted
    #[serde(default)]
    pub department: Option<String>,
    pub payment_method: String,
    pub payment_type: String,
    pub hourly_rate: Decimal,
    pub quantity: i32,
    pub professor_salary: Decimal,
    pub charges: Decimal,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSettlementNote {
    pub fn validate(&self) -> AppResult<()> {
        if self.student_ids.is_empty() {
            return Err(AppError::Validation(
                "at least one student is required".to_string(),
            ));
        }
        let unique: HashSet<&Uuid> = self.student_ids.iter().collect();
        if unique.len() != self.student_ids.len() {
            return Err(AppError::Validation(
                "student_ids must not contain duplicates".to_string(),
            ));
        }
        if self.quantity < 1 || self.quantity > MAX_QUANTITY {
            return Err(AppError::Validation(format!(
                "quantity must be between 1 and {}",
                MAX_QUANTITY
            )));
        }
        validate_amount("hourly_rate", self.hourly_rate)?;
        validate_amount("professor_salary", self.professor_salary)?;
        validate_amount("charges", self.charges)?;
        self.payment_method()?;
        self.payment_type()?;
        if let Some(department) = clean_optional(&self.department) {
            validate_department(&department)?;
        }
        Ok(())
    }

    pub fn payment_method(&self) -> AppResult<PaymentMethod> {
        parse_enum(&self.payment_method)
    }

    pub fn payment_type(&self) -> AppResult<PaymentType> {
        parse_enum(&self.payment_type)
    }

    pub fn financials(&self) -> AppResult<NoteFinancials> {
        NoteFinancials::compute(
            self.hourly_rate,
            self.quantity,
            self.professor_salary,
            self.charges,
        )
    }
}

fn validate_department(department: &str) -> AppResult<()> {
    let valid = (2..=3).contains(&department.len())
        && department.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(AppError::Validation(
            "department must be a 2 or 3 character code".to_string(),
        ));
    }
    Ok(())
}

/// Editable fields once a note exists. Financial fields are immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettlementNoteUpdate {
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
}

impl SettlementNoteUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(method) = &self.payment_method {
            parse_enum::<PaymentMethod>(method)?;
        }
        self.status()?;
        Ok(())
    }

    pub fn status(&self) -> AppResult<Option<SettlementNoteStatus>> {
        clean_optional(&self.status).map(|s| parse_enum(&s)).transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettlementNoteFilter {
    pub family_id: Option<Uuid>,
    pub status: Option<String>,
}

impl SettlementNoteFilter {
    pub fn status(&self) -> AppResult<Option<SettlementNoteStatus>> {
        clean_optional(&self.status).map(|s| parse_enum(&s)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note() -> NewSettlementNote {
        NewSettlementNote {
            family_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            professor_id: None,
            student_ids: vec![Uuid::new_v4()],
            department: None,
            payment_method: "transfer".to_string(),
            payment_type: "immediate_advance".to_string(),
            hourly_rate: Decimal::new(4000, 2),
            quantity: 10,
            professor_salary: Decimal::new(2000, 2),
            charges: Decimal::new(500, 2),
            due_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_financials_reference_case() {
        // 10 h at 40 €/h, professor paid 20 €/h, charges 5 €/h
        let financials = NoteFinancials::compute(
            Decimal::new(4000, 2),
            10,
            Decimal::new(2000, 2),
            Decimal::new(500, 2),
        )
        .unwrap();
        assert_eq!(financials.total_amount, Decimal::new(400, 0));
        assert_eq!(financials.salary_to_pay, Decimal::new(200, 0));
        assert_eq!(financials.charges_to_pay, Decimal::new(50, 0));
        assert_eq!(financials.margin_amount, Decimal::new(150, 0));
        assert_eq!(financials.margin_percentage, Decimal::new(3750, 2));
    }

    #[test]
    fn test_financials_zero_rate() {
        let financials =
            NoteFinancials::compute(Decimal::ZERO, 4, Decimal::new(15, 0), Decimal::ZERO)
                .unwrap();
        assert_eq!(financials.total_amount, Decimal::ZERO);
        assert_eq!(financials.margin_amount, Decimal::new(-60, 0));
        assert_eq!(financials.margin_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_financials_rounds_percentage() {
        // 3 h at 30 €/h, salary 17 €/h, charges 3.5 €/h: margin 28.5 / 90
        let financials = NoteFinancials::compute(
            Decimal::new(30, 0),
            3,
            Decimal::new(17, 0),
            Decimal::new(35, 1),
        )
        .unwrap();
        assert_eq!(financials.margin_amount, Decimal::new(285, 1));
        assert_eq!(financials.margin_percentage, Decimal::new(3167, 2));
    }

    #[test]
    fn test_new_note_valid() {
        let note = new_note();
        assert!(note.validate().is_ok());
        assert_eq!(note.payment_method().unwrap(), PaymentMethod::Transfer);
        assert_eq!(note.payment_type().unwrap(), PaymentType::ImmediateAdvance);
    }

    #[test]
    fn test_new_note_requires_student() {
        let note = NewSettlementNote {
            student_ids: vec![],
            ..new_note()
        };
        assert!(note.validate().is_err());
    }

    #[test]
    fn test_new_note_duplicate_students() {
        let id = Uuid::new_v4();
        let note = NewSettlementNote {
            student_ids: vec![id, id],
            ..new_note()
        };
        assert!(note.validate().is_err());
    }

    #[test]
    fn test_new_note_quantity_bounds() {
        assert!(NewSettlementNote { quantity: 0, ..new_note() }.validate().is_err());
        assert!(NewSettlementNote { quantity: MAX_QUANTITY + 1, ..new_note() }
            .validate()
            .is_err());
        assert!(NewSettlementNote { quantity: MAX_QUANTITY, ..new_note() }
            .validate()
            .is_ok());
    }

    #[test]
    fn test_new_note_negative_charges() {
        let note = NewSettlementNote {
            charges: Decimal::new(-1, 0),
            ..new_note()
        };
        assert!(note.validate().is_err());
    }

    #[test]
    fn test_financials_overflow_is_rejected() {
        let err = NoteFinancials::compute(Decimal::MAX, 2, Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_financials_tiny_rate_large_salary() {
        // 1 h at 0.01 €/h against a 100 €/h salary
        let financials = NoteFinancials::compute(
            Decimal::new(1, 2),
            1,
            Decimal::new(100, 0),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(financials.margin_amount, Decimal::new(-9999, 2));
        assert_eq!(financials.margin_percentage, Decimal::new(-999_900, 0));
    }

    #[test]
    fn test_financials_at_amount_limits() {
        let max = crate::models::validation::max_amount();
        let financials =
            NoteFinancials::compute(Decimal::new(1, 2), MAX_QUANTITY, max, max).unwrap();
        assert_eq!(financials.total_amount, Decimal::new(2, 0));
        assert_eq!(financials.margin_amount, Decimal::new(-39_999_999_994, 0));
        assert_eq!(
            financials.margin_percentage,
            Decimal::new(-1_999_999_999_700, 0)
        );
    }

    #[test]
    fn test_new_note_amount_out_of_range() {
        let mut note = new_note();
        note.hourly_rate = Decimal::MAX;
        note.quantity = 2;
        assert!(matches!(note.validate(), Err(AppError::Validation(_))));

        let mut note = new_note();
        note.professor_salary = Decimal::new(100_000_000, 0);
        assert!(note.validate().is_err());

        let mut note = new_note();
        note.charges = Decimal::new(7125, 3);
        assert!(note.validate().is_err());
    }

    #[test]
    fn test_new_note_bad_department() {
        let note = NewSettlementNote {
            department: Some("7".to_string()),
            ..new_note()
        };
        assert!(note.validate().is_err());
        let note = NewSettlementNote {
            department: Some("2A".to_string()),
            ..new_note()
        };
        assert!(note.validate().is_ok());
    }

    #[test]
    fn test_note_number_format() {
        assert_eq!(format_note_number(2025, 42), "NDR-2025-000042");
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let update = SettlementNoteUpdate {
            status: Some("cancelled".to_string()),
            ..SettlementNoteUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
