use crate::error::{AppError, AppResult};
use crate::models::{
    Professor, ProfessorFilter, ProfessorInput, ProfessorSubjectsInput, ProfessorWithSubjects,
};
use crate::repositories::{ProfessorRepository, SubjectRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for professors and the subjects they teach
pub struct ProfessorService {
    professor_repo: Arc<ProfessorRepository>,
    subject_repo: Arc<SubjectRepository>,
}

impl ProfessorService {
    pub fn new(
        professor_repo: Arc<ProfessorRepository>,
        subject_repo: Arc<SubjectRepository>,
    ) -> Self {
        Self {
            professor_repo,
            subject_repo,
        }
    }

    /// Every id must name an existing subject
    async fn check_subjects(&self, subject_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        let unique: Vec<Uuid> = subject_ids
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(unique);
        }

        let found = self.subject_repo.find_by_ids(&unique).await?;
        if found.len() != unique.len() {
            let known: HashSet<Uuid> = found.iter().map(|s| s.id).collect();
            let missing: Vec<String> = unique
                .iter()
                .filter(|id| !known.contains(*id))
                .map(|id| id.to_string())
                .collect();
            return Err(AppError::Validation(format!(
                "Unknown subject(s): {}",
                missing.join(", ")
            )));
        }

        Ok(unique)
    }

    async fn with_subjects(&self, professor: Professor) -> AppResult<ProfessorWithSubjects> {
        let mut subjects = self.professor_repo.subjects_for(&[professor.id]).await?;
        Ok(ProfessorWithSubjects {
            subjects: subjects.remove(&professor.id).unwrap_or_default(),
            professor,
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ProfessorWithSubjects> {
        let professor = self
            .professor_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Professor {} not found", id)))?;
        self.with_subjects(professor).await
    }

    pub async fn list(&self, filter: &ProfessorFilter) -> AppResult<Vec<ProfessorWithSubjects>> {
        let status = filter.status()?;
        let professors = self.professor_repo.list(filter.subject_id, status).await?;

        let ids: Vec<Uuid> = professors.iter().map(|p| p.id).collect();
        let mut subjects = self.professor_repo.subjects_for(&ids).await?;

        Ok(professors
            .into_iter()
            .map(|professor| ProfessorWithSubjects {
                subjects: subjects.remove(&professor.id).unwrap_or_default(),
                professor,
            })
            .collect())
    }

    pub async fn create(&self, mut input: ProfessorInput) -> AppResult<ProfessorWithSubjects> {
        input.validate()?;
        let status = input.status()?;
        if let Some(subject_ids) = input.subject_ids.take() {
            input.subject_ids = Some(self.check_subjects(&subject_ids).await?);
        }

        let professor = self.professor_repo.create(&input, status).await?;
        info!("Created professor {} ({})", professor.id, professor.email);
        self.with_subjects(professor).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        mut input: ProfessorInput,
    ) -> AppResult<ProfessorWithSubjects> {
        input.validate()?;
        let status = input.status()?;
        if let Some(subject_ids) = input.subject_ids.take() {
            input.subject_ids = Some(self.check_subjects(&subject_ids).await?);
        }

        let professor = self
            .professor_repo
            .update(id, &input, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Professor {} not found", id)))?;
        self.with_subjects(professor).await
    }

    /// Replace the professor's subject set
    pub async fn set_subjects(
        &self,
        id: Uuid,
        input: ProfessorSubjectsInput,
    ) -> AppResult<ProfessorWithSubjects> {
        let subject_ids = self.check_subjects(&input.subject_ids).await?;
        if !self.professor_repo.set_subjects(id, &subject_ids).await? {
            return Err(AppError::NotFound(format!("Professor {} not found", id)));
        }

        info!("Professor {} now teaches {} subject(s)", id, subject_ids.len());
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.professor_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Professor {} not found", id)));
        }

        info!("Deleted professor {}", id);
        Ok(())
    }
}
