pub mod auth_service;
pub mod coupon_service;
pub mod dashboard_service;
pub mod family_service;
pub mod professor_service;
pub mod settlement_service;
pub mod student_service;
pub mod subject_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginRequest, LoginResponse};
pub use coupon_service::CouponService;
pub use dashboard_service::DashboardService;
pub use family_service::FamilyService;
pub use professor_service::ProfessorService;
pub use settlement_service::SettlementService;
pub use student_service::StudentService;
pub use subject_service::SubjectService;
pub use user_service::UserService;
