use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headline figures for the back-office home page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub prospect_count: i64,
    pub client_count: i64,
    pub student_count: i64,
    pub active_professor_count: i64,
    pub settlement_note_count: i64,
    pub total_revenue: Decimal,
    pub total_margin: Decimal,
    pub average_margin_percentage: Decimal,
    pub outstanding_amount: Decimal,
    pub remaining_coupons: i64,
}

impl DashboardStats {
    /// Overall margin rate, weighted by revenue rather than averaged per note.
    pub fn weighted_margin_percentage(total_revenue: Decimal, total_margin: Decimal) -> Decimal {
        if total_revenue.is_zero() {
            Decimal::ZERO
        } else {
            (total_margin / total_revenue * Decimal::ONE_HUNDRED).round_dp(2)
        }
    }
}
