//! Domain models for the ABC Cours CRM.
//!
//! Row structs mirror the database tables and derive `sqlx::FromRow`.
//! Enumerated columns are stored as TEXT; each has a typed enum with
//! `as_str`/`FromStr` conversions used for validation and comparisons.
//! Input structs (`*Input`, `New*`, `*Update`) carry request payloads and
//! validate themselves before anything reaches the database.

use serde::{Deserialize, Serialize};

/// Declare an enum persisted as a TEXT column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident($label:literal) { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Convert to database string
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", $label, s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

pub mod coupon;
pub mod dashboard;
pub mod family;
pub mod professor;
pub mod settlement_note;
pub mod student;
pub mod subject;
pub mod user;
pub mod validation;

// Re-export all models for convenient access
pub use coupon::{
    coupon_code, Coupon, CouponFilter, CouponSeries, CouponSeriesDetail, CouponSeriesFilter,
    CouponSeriesStatus, CouponStatus, UseCouponInput,
};
pub use dashboard::DashboardStats;
pub use family::{
    department_from_postal_code, Family, FamilyDetail, FamilyFilter, FamilyInput, FamilyStatus,
    NextActionInput, ProspectStatus, ProspectStatusInput,
};
pub use professor::{
    Professor, ProfessorFilter, ProfessorInput, ProfessorStatus, ProfessorSubjectsInput,
    ProfessorWithSubjects,
};
pub use settlement_note::{
    NewSettlementNote, NoteFinancials, PaymentMethod, PaymentType, SettlementNote,
    SettlementNoteDetail, SettlementNoteFilter, SettlementNoteStatus, SettlementNoteUpdate,
};
pub use student::{SchoolLevel, Student, StudentFilter, StudentInput};
pub use subject::{Subject, SubjectCategory, SubjectFilter, SubjectInput};
pub use user::{NewUser, UpdateUser, User, UserRole};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Pagination window resolved from optional `page`/`limit` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Pages start at 1; limit is clamped to `1..=100` and defaults to 20.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates so any page number maps to a valid OFFSET.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a listing plus the total number of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + params.limit - 1) / params.limit
        };
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_defaults_and_clamping() {
        let params = PageParams::new(None, None);
        assert_eq!(params, PageParams { page: 1, limit: 20 });
        assert_eq!(params.offset(), 0);

        let params = PageParams::new(Some(0), Some(1000));
        assert_eq!(params, PageParams { page: 1, limit: 100 });

        let params = PageParams::new(Some(3), Some(10));
        assert_eq!(params.offset(), 20);

        let params = PageParams::new(Some(i64::MAX), Some(100));
        assert_eq!(params.offset(), i64::MAX);
        assert_eq!(PageParams::new(Some(i64::MIN), None).offset(), 0);
    }

    #[test]
    fn page_counts_total_pages() {
        let params = PageParams::new(Some(1), Some(10));
        assert_eq!(Page::new(vec![1, 2, 3], 25, params).total_pages, 3);
        assert_eq!(Page::<i32>::new(vec![], 0, params).total_pages, 0);
        assert_eq!(Page::new(vec![1], 10, params).total_pages, 1);
    }
}
