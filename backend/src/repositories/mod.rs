pub mod coupon_repository;
pub mod family_repository;
pub mod professor_repository;
pub mod settlement_note_repository;
pub mod student_repository;
pub mod subject_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use coupon_repository::CouponRepository;
pub use family_repository::FamilyRepository;
pub use professor_repository::ProfessorRepository;
pub use settlement_note_repository::{NoteDraft, NoteTotals, SettlementNoteRepository};
pub use student_repository::StudentRepository;
pub use subject_repository::SubjectRepository;
pub use user_repository::UserRepository;
