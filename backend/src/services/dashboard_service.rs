use crate::error::AppResult;
use crate::models::DashboardStats;
use crate::repositories::{
    CouponRepository, FamilyRepository, ProfessorRepository, SettlementNoteRepository,
    StudentRepository,
};
use std::sync::Arc;

/// Aggregates the headline figures shown on the dashboard
pub struct DashboardService {
    family_repo: Arc<FamilyRepository>,
    student_repo: Arc<StudentRepository>,
    professor_repo: Arc<ProfessorRepository>,
    note_repo: Arc<SettlementNoteRepository>,
    coupon_repo: Arc<CouponRepository>,
}

impl DashboardService {
    pub fn new(
        family_repo: Arc<FamilyRepository>,
        student_repo: Arc<StudentRepository>,
        professor_repo: Arc<ProfessorRepository>,
        note_repo: Arc<SettlementNoteRepository>,
        coupon_repo: Arc<CouponRepository>,
    ) -> Self {
        Self {
            family_repo,
            student_repo,
            professor_repo,
            note_repo,
            coupon_repo,
        }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let (prospect_count, client_count) = self.family_repo.count_by_status().await?;
        let student_count = self.student_repo.count_active().await?;
        let active_professor_count = self.professor_repo.count_active().await?;
        let totals = self.note_repo.totals().await?;
        let remaining_coupons = self.coupon_repo.remaining_total().await?;

        Ok(DashboardStats {
            prospect_count,
            client_count,
            student_count,
            active_professor_count,
            settlement_note_count: totals.note_count,
            total_revenue: totals.total_revenue,
            total_margin: totals.total_margin,
            average_margin_percentage: DashboardStats::weighted_margin_percentage(
                totals.total_revenue,
                totals.total_margin,
            ),
            outstanding_amount: totals.outstanding_amount,
            remaining_coupons,
        })
    }
}
