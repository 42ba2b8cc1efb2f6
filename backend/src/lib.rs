//! ABC Cours CRM Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use api::build_router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::JwtKeys;
use config::AuthConfig;
use database::Database;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all services, shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub jwt: Arc<JwtKeys>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub subject_service: Arc<SubjectService>,
    pub family_service: Arc<FamilyService>,
    pub student_service: Arc<StudentService>,
    pub professor_service: Arc<ProfessorService>,
    pub settlement_service: Arc<SettlementService>,
    pub coupon_service: Arc<CouponService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool, auth_config: &AuthConfig) -> Self {
        let database = Database::new(pool.clone());
        let jwt = Arc::new(JwtKeys::new(auth_config));

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let subject_repo = Arc::new(SubjectRepository::new(pool.clone()));
        let family_repo = Arc::new(FamilyRepository::new(pool.clone()));
        let student_repo = Arc::new(StudentRepository::new(pool.clone()));
        let professor_repo = Arc::new(ProfessorRepository::new(pool.clone()));
        let note_repo = Arc::new(SettlementNoteRepository::new(pool.clone()));
        let coupon_repo = Arc::new(CouponRepository::new(pool));

        Self {
            database,
            jwt: jwt.clone(),
            auth_service: Arc::new(AuthService::new(user_repo.clone(), jwt)),
            user_service: Arc::new(UserService::new(user_repo)),
            subject_service: Arc::new(SubjectService::new(subject_repo.clone())),
            family_service: Arc::new(FamilyService::new(
                family_repo.clone(),
                student_repo.clone(),
                note_repo.clone(),
            )),
            student_service: Arc::new(StudentService::new(
                student_repo.clone(),
                family_repo.clone(),
            )),
            professor_service: Arc::new(ProfessorService::new(
                professor_repo.clone(),
                subject_repo.clone(),
            )),
            settlement_service: Arc::new(SettlementService::new(
                note_repo.clone(),
                family_repo.clone(),
                student_repo.clone(),
                subject_repo,
                professor_repo.clone(),
            )),
            coupon_service: Arc::new(CouponService::new(
                coupon_repo.clone(),
                professor_repo.clone(),
            )),
            dashboard_service: Arc::new(DashboardService::new(
                family_repo,
                student_repo,
                professor_repo,
                note_repo,
                coupon_repo,
            )),
        }
    }
}
