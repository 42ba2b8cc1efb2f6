use crate::error::RepositoryError;
use crate::models::validation::clean_optional;
use crate::models::{Subject, SubjectCategory, SubjectInput};
use sqlx::PgPool;
use uuid::Uuid;

const SUBJECT_COLUMNS: &str =
    "id, name, category, description, is_active, created_at, updated_at";

/// Repository for subjects
pub struct SubjectRepository {
    pool: PgPool,
}

impl SubjectRepository {
    /// Create a new SubjectRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        input: &SubjectInput,
        category: SubjectCategory,
    ) -> Result<Subject, RepositoryError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            r#"
            INSERT INTO subjects (name, category, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SUBJECT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(category.as_str())
        .bind(clean_optional(&input.description))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(subject)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Subject>, RepositoryError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "SELECT {} FROM subjects WHERE id = $1",
            SUBJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    /// Subjects sorted by name, optionally restricted by `is_active`
    pub async fn list(&self, active: Option<bool>) -> Result<Vec<Subject>, RepositoryError> {
        let subjects = sqlx::query_as::<_, Subject>(&format!(
            r#"
            SELECT {} FROM subjects
            WHERE ($1::boolean IS NULL OR is_active = $1)
            ORDER BY name
            "#,
            SUBJECT_COLUMNS
        ))
        .bind(active)
        .fetch_all(&self.pool)
        .await?;

        Ok(subjects)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Subject>, RepositoryError> {
        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "SELECT {} FROM subjects WHERE id = ANY($1) ORDER BY name",
            SUBJECT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(subjects)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: &SubjectInput,
        category: SubjectCategory,
    ) -> Result<Option<Subject>, RepositoryError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            r#"
            UPDATE subjects
            SET name = $2,
                category = $3,
                description = $4,
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SUBJECT_COLUMNS
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(category.as_str())
        .bind(clean_optional(&input.description))
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    /// Delete a subject. Fails on the foreign key when a settlement note
    /// references it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
