use crate::error::{AppError, AppResult};
use crate::models::{Student, StudentInput};
use crate::repositories::{FamilyRepository, StudentRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for the students attached to families
pub struct StudentService {
    student_repo: Arc<StudentRepository>,
    family_repo: Arc<FamilyRepository>,
}

impl StudentService {
    pub fn new(student_repo: Arc<StudentRepository>, family_repo: Arc<FamilyRepository>) -> Self {
        Self {
            student_repo,
            family_repo,
        }
    }

    async fn ensure_family(&self, family_id: Uuid) -> AppResult<()> {
        self.family_repo
            .find_by_id(family_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Family {} not found", family_id)))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Student> {
        self.student_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    pub async fn list(&self, family_id: Option<Uuid>) -> AppResult<Vec<Student>> {
        Ok(self.student_repo.list(family_id).await?)
    }

    /// Students of one family; 404 when the family does not exist
    pub async fn list_for_family(&self, family_id: Uuid) -> AppResult<Vec<Student>> {
        self.ensure_family(family_id).await?;
        Ok(self.student_repo.list(Some(family_id)).await?)
    }

    pub async fn create(&self, input: StudentInput) -> AppResult<Student> {
        input.validate()?;
        let level = input.level()?;
        self.ensure_family(input.family_id).await?;

        let student = self.student_repo.create(&input, level).await?;
        info!("Created student {} in family {}", student.id, student.family_id);
        Ok(student)
    }

    pub async fn update(&self, id: Uuid, input: StudentInput) -> AppResult<Student> {
        input.validate()?;
        let level = input.level()?;
        self.ensure_family(input.family_id).await?;

        self.student_repo
            .update(id, &input, level)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.student_repo.delete(id).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "Student {} is referenced by a settlement note",
                id
            )),
            other => other,
        })?;

        if !deleted {
            return Err(AppError::NotFound(format!("Student {} not found", id)));
        }

        info!("Deleted student {}", id);
        Ok(())
    }
}
