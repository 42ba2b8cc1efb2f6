use crate::error::{AppError, AppResult};
use crate::models::validation::{clean_optional, parse_enum};
use crate::models::{
    Family, NewSettlementNote, Page, PageParams, PaymentMethod, SettlementNote, SettlementNoteDetail,
    SettlementNoteFilter, SettlementNoteStatus, SettlementNoteUpdate,
};
use crate::repositories::{
    FamilyRepository, NoteDraft, ProfessorRepository, SettlementNoteRepository, StudentRepository,
    SubjectRepository,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for settlement notes (NDR)
pub struct SettlementService {
    note_repo: Arc<SettlementNoteRepository>,
    family_repo: Arc<FamilyRepository>,
    student_repo: Arc<StudentRepository>,
    subject_repo: Arc<SubjectRepository>,
    professor_repo: Arc<ProfessorRepository>,
}

/// Department printed on the note: the explicit one, else the one derived
/// from the family's postal code.
fn resolve_department(explicit: Option<String>, family: &Family) -> AppResult<String> {
    explicit
        .map(|d| d.to_uppercase())
        .or_else(|| family.department())
        .ok_or_else(|| {
            AppError::Validation(
                "department is required when the family has no valid postal code".to_string(),
            )
        })
}

impl SettlementService {
    pub fn new(
        note_repo: Arc<SettlementNoteRepository>,
        family_repo: Arc<FamilyRepository>,
        student_repo: Arc<StudentRepository>,
        subject_repo: Arc<SubjectRepository>,
        professor_repo: Arc<ProfessorRepository>,
    ) -> Self {
        Self {
            note_repo,
            family_repo,
            student_repo,
            subject_repo,
            professor_repo,
        }
    }

    async fn get_family(&self, id: Uuid) -> AppResult<Family> {
        self.family_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", id)))
    }

    /// Validate, compute the financials and store the note with its coupon
    /// series. The family becomes a client in the same transaction.
    pub async fn create(
        &self,
        input: NewSettlementNote,
        created_by: Uuid,
    ) -> AppResult<SettlementNoteDetail> {
        input.validate()?;
        let payment_method = input.payment_method()?;
        let payment_type = input.payment_type()?;

        let family = self.get_family(input.family_id).await?;

        if self.subject_repo.find_by_id(input.subject_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Subject {} not found",
                input.subject_id
            )));
        }
        if let Some(professor_id) = input.professor_id {
            if self.professor_repo.find_by_id(professor_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Professor {} not found",
                    professor_id
                )));
            }
        }

        let owned: HashSet<Uuid> = self
            .student_repo
            .find_in_family(family.id, &input.student_ids)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if let Some(stranger) = input.student_ids.iter().find(|id| !owned.contains(*id)) {
            return Err(AppError::Validation(format!(
                "Student {} does not belong to family {}",
                stranger, family.id
            )));
        }

        let department = resolve_department(clean_optional(&input.department), &family)?;
        let financials = input.financials()?;

        let detail = self
            .note_repo
            .create(NoteDraft {
                input: &input,
                client_name: family.client_name(),
                department,
                payment_method,
                payment_type,
                financials,
                created_by: Some(created_by),
            })
            .await?;

        info!(
            "Created settlement note {} for family {}: total {} margin {} ({}%)",
            detail.note.number,
            family.id,
            financials.total_amount,
            financials.margin_amount,
            financials.margin_percentage
        );
        Ok(detail)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SettlementNoteDetail> {
        self.note_repo
            .find_detail(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settlement note {} not found", id)))
    }

    pub async fn list(
        &self,
        filter: &SettlementNoteFilter,
        page: PageParams,
    ) -> AppResult<Page<SettlementNote>> {
        let status = filter.status()?;
        let (notes, total) = self.note_repo.list(filter.family_id, status, page).await?;
        Ok(Page::new(notes, total, page))
    }

    pub async fn list_for_family(&self, family_id: Uuid) -> AppResult<Vec<SettlementNote>> {
        self.get_family(family_id).await?;
        Ok(self.note_repo.list_for_family(family_id).await?)
    }

    /// Change notes, due date, payment method or status. Amounts never change.
    pub async fn update(
        &self,
        id: Uuid,
        input: SettlementNoteUpdate,
    ) -> AppResult<SettlementNoteDetail> {
        input.validate()?;
        let status = input.status()?;
        let payment_method = clean_optional(&input.payment_method)
            .map(|m| parse_enum::<PaymentMethod>(&m))
            .transpose()?;
        let notes = clean_optional(&input.notes);

        let note = self
            .note_repo
            .update(id, notes.as_deref(), input.due_date, payment_method, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settlement note {} not found", id)))?;

        Ok(self.note_repo.detail(note).await?)
    }

    pub async fn mark_paid(&self, id: Uuid) -> AppResult<SettlementNoteDetail> {
        let note = self
            .note_repo
            .update(id, None, None, None, Some(SettlementNoteStatus::Paid))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settlement note {} not found", id)))?;

        info!("Settlement note {} marked paid", note.number);
        Ok(self.note_repo.detail(note).await?)
    }

    /// Delete the note and its coupons; the family falls back to prospect
    /// when no note remains.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.note_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Settlement note {} not found", id)));
        }

        info!("Deleted settlement note {}", id);
        Ok(())
    }
}
