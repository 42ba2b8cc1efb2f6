use crate::error::{AppError, AppResult};
use crate::models::validation::clean_optional;
use crate::models::{
    Family, FamilyDetail, FamilyFilter, FamilyInput, NextActionInput, Page, PageParams,
    ProspectStatusInput,
};
use crate::repositories::{FamilyRepository, SettlementNoteRepository, StudentRepository};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for prospects and client families
pub struct FamilyService {
    family_repo: Arc<FamilyRepository>,
    student_repo: Arc<StudentRepository>,
    note_repo: Arc<SettlementNoteRepository>,
}

impl FamilyService {
    pub fn new(
        family_repo: Arc<FamilyRepository>,
        student_repo: Arc<StudentRepository>,
        note_repo: Arc<SettlementNoteRepository>,
    ) -> Self {
        Self {
            family_repo,
            student_repo,
            note_repo,
        }
    }

    /// Fetch a family or fail with 404
    pub async fn get(&self, id: Uuid) -> AppResult<Family> {
        self.family_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", id)))
    }

    pub async fn get_detail(&self, id: Uuid) -> AppResult<FamilyDetail> {
        let family = self.get(id).await?;
        let students = self.student_repo.list(Some(id)).await?;
        let settlement_note_count = self.note_repo.count_for_family(id).await?;

        Ok(FamilyDetail {
            family,
            students,
            settlement_note_count,
        })
    }

    pub async fn list(&self, filter: &FamilyFilter, page: PageParams) -> AppResult<Page<Family>> {
        let status = filter.status()?;
        let search = filter.search();
        let (families, total) = self
            .family_repo
            .list(status, search.as_deref(), page)
            .await?;

        Ok(Page::new(families, total, page))
    }

    pub async fn create(&self, input: FamilyInput, created_by: Uuid) -> AppResult<Family> {
        input.validate()?;
        let prospect_status = input.prospect_status()?;
        let family = self
            .family_repo
            .create(&input, prospect_status, Some(created_by))
            .await?;

        info!("Created family {} ({})", family.id, family.client_name());
        Ok(family)
    }

    pub async fn update(&self, id: Uuid, input: FamilyInput) -> AppResult<Family> {
        input.validate()?;
        let prospect_status = input.prospect_status()?;
        self.family_repo
            .update(id, &input, prospect_status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", id)))
    }

    /// Delete a family with its students. Families holding settlement notes
    /// are kept.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let family = self.get(id).await?;
        let notes = self.note_repo.count_for_family(id).await?;
        if notes > 0 {
            return Err(AppError::Conflict(format!(
                "Family {} still has {} settlement note(s)",
                family.client_name(),
                notes
            )));
        }

        if !self.family_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Family {} not found", id)));
        }

        info!("Deleted family {}", id);
        Ok(())
    }

    pub async fn update_prospect_status(
        &self,
        id: Uuid,
        input: ProspectStatusInput,
    ) -> AppResult<Family> {
        let prospect_status = input.prospect_status()?;
        self.family_repo
            .update_prospect_status(id, prospect_status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", id)))
    }

    pub async fn update_next_action(&self, id: Uuid, input: NextActionInput) -> AppResult<Family> {
        let note = clean_optional(&input.note);
        self.family_repo
            .update_next_action(id, input.date, note.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", id)))
    }

    /// Prospects to call back on or before `before`
    pub async fn reminders(&self, before: NaiveDate) -> AppResult<Vec<Family>> {
        Ok(self.family_repo.find_due_reminders(before).await?)
    }
}
