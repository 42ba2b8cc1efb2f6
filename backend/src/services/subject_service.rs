use crate::error::{AppError, AppResult};
use crate::models::{Subject, SubjectInput};
use crate::repositories::SubjectRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for the subject catalogue
pub struct SubjectService {
    subject_repo: Arc<SubjectRepository>,
}

impl SubjectService {
    pub fn new(subject_repo: Arc<SubjectRepository>) -> Self {
        Self { subject_repo }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Subject> {
        self.subject_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subject {} not found", id)))
    }

    pub async fn list(&self, active: Option<bool>) -> AppResult<Vec<Subject>> {
        Ok(self.subject_repo.list(active).await?)
    }

    pub async fn create(&self, input: SubjectInput) -> AppResult<Subject> {
        input.validate()?;
        let category = input.category()?;
        let subject = self.subject_repo.create(&input, category).await?;
        info!("Created subject {}", subject.name);
        Ok(subject)
    }

    pub async fn update(&self, id: Uuid, input: SubjectInput) -> AppResult<Subject> {
        input.validate()?;
        let category = input.category()?;
        self.subject_repo
            .update(id, &input, category)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subject {} not found", id)))
    }

    /// Subjects still used by settlement notes or coupon series cannot go.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.subject_repo.delete(id).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Subject {} is referenced by settlement notes",
                id
            )),
            other => other,
        })?;

        if !deleted {
            return Err(AppError::NotFound(format!("Subject {} not found", id)));
        }

        info!("Deleted subject {}", id);
        Ok(())
    }
}
