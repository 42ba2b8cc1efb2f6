use crate::error::RepositoryError;
use crate::models::validation::clean_optional;
use crate::models::{Professor, ProfessorInput, ProfessorStatus, Subject};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

const PROFESSOR_COLUMNS: &str = r#"
    id, first_name, last_name, email, phone, postal_code, city,
    hourly_rate, status, notes, created_at, updated_at
"#;

/// One subject of one professor, as returned by the join table
#[derive(Debug, FromRow)]
struct ProfessorSubjectRow {
    professor_id: Uuid,
    #[sqlx(flatten)]
    subject: Subject,
}

/// Repository for professors and their subjects
pub struct ProfessorRepository {
    pool: PgPool,
}

impl ProfessorRepository {
    /// Create a new ProfessorRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a professor and link its subjects atomically
    pub async fn create(
        &self,
        input: &ProfessorInput,
        status: ProfessorStatus,
    ) -> Result<Professor, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let professor = sqlx::query_as::<_, Professor>(&format!(
            r#"
            INSERT INTO professors (
                first_name, last_name, email, phone, postal_code, city,
                hourly_rate, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PROFESSOR_COLUMNS
        ))
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.normalized_email())
        .bind(clean_optional(&input.phone))
        .bind(clean_optional(&input.postal_code))
        .bind(clean_optional(&input.city))
        .bind(input.hourly_rate.unwrap_or(Decimal::ZERO))
        .bind(status.as_str())
        .bind(clean_optional(&input.notes))
        .fetch_one(&mut *tx)
        .await?;

        if let Some(subject_ids) = &input.subject_ids {
            replace_subjects(&mut tx, professor.id, subject_ids).await?;
        }

        tx.commit().await?;

        Ok(professor)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Professor>, RepositoryError> {
        let professor = sqlx::query_as::<_, Professor>(&format!(
            "SELECT {} FROM professors WHERE id = $1",
            PROFESSOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(professor)
    }

    /// Professors sorted by name, optionally restricted to those teaching
    /// `subject_id` and/or having `status`
    pub async fn list(
        &self,
        subject_id: Option<Uuid>,
        status: Option<ProfessorStatus>,
    ) -> Result<Vec<Professor>, RepositoryError> {
        let professors = sqlx::query_as::<_, Professor>(&format!(
            r#"
            SELECT {} FROM professors p
            WHERE ($1::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM professor_subjects ps
                    WHERE ps.professor_id = p.id AND ps.subject_id = $1
                ))
                AND ($2::text IS NULL OR p.status = $2)
            ORDER BY p.last_name, p.first_name
            "#,
            PROFESSOR_COLUMNS
        ))
        .bind(subject_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(professors)
    }

    /// Subjects of each requested professor, loaded in a single query
    pub async fn subjects_for(
        &self,
        professor_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Subject>>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfessorSubjectRow>(
            r#"
            SELECT ps.professor_id, s.id, s.name, s.category, s.description,
                   s.is_active, s.created_at, s.updated_at
            FROM professor_subjects ps
            JOIN subjects s ON s.id = ps.subject_id
            WHERE ps.professor_id = ANY($1)
            ORDER BY s.name
            "#,
        )
        .bind(professor_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_professor: HashMap<Uuid, Vec<Subject>> = HashMap::new();
        for row in rows {
            by_professor
                .entry(row.professor_id)
                .or_default()
                .push(row.subject);
        }

        Ok(by_professor)
    }

    /// Replace the editable fields, and the subjects when `subject_ids` is set
    pub async fn update(
        &self,
        id: Uuid,
        input: &ProfessorInput,
        status: ProfessorStatus,
    ) -> Result<Option<Professor>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let professor = sqlx::query_as::<_, Professor>(&format!(
            r#"
            UPDATE professors
            SET first_name = $2,
                last_name = $3,
                email = $4,
                phone = $5,
                postal_code = $6,
                city = $7,
                hourly_rate = COALESCE($8, hourly_rate),
                status = $9,
                notes = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFESSOR_COLUMNS
        ))
        .bind(id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.normalized_email())
        .bind(clean_optional(&input.phone))
        .bind(clean_optional(&input.postal_code))
        .bind(clean_optional(&input.city))
        .bind(input.hourly_rate)
        .bind(status.as_str())
        .bind(clean_optional(&input.notes))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(professor) = professor else {
            return Ok(None);
        };

        if let Some(subject_ids) = &input.subject_ids {
            replace_subjects(&mut tx, professor.id, subject_ids).await?;
        }

        tx.commit().await?;

        Ok(Some(professor))
    }

    /// Replace the whole subject set. Returns false if the professor does not exist.
    pub async fn set_subjects(
        &self,
        id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM professors WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();

        if !exists {
            return Ok(false);
        }

        replace_subjects(&mut tx, id, subject_ids).await?;
        sqlx::query("UPDATE professors SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM professors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM professors WHERE status = $1",
        )
        .bind(ProfessorStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

async fn replace_subjects(
    tx: &mut Transaction<'_, Postgres>,
    professor_id: Uuid,
    subject_ids: &[Uuid],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM professor_subjects WHERE professor_id = $1")
        .bind(professor_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO professor_subjects (professor_id, subject_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(professor_id)
    .bind(subject_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
