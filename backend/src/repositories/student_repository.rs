use crate::error::RepositoryError;
use crate::models::validation::clean_optional;
use crate::models::{SchoolLevel, Student, StudentInput};
use sqlx::PgPool;
use uuid::Uuid;

const STUDENT_COLUMNS: &str = r#"
    id, family_id, first_name, last_name, date_of_birth, school_name,
    level, grade, notes, is_active, created_at, updated_at
"#;

/// Repository for students
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    /// Create a new StudentRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new student
    pub async fn create(
        &self,
        input: &StudentInput,
        level: SchoolLevel,
    ) -> Result<Student, RepositoryError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (
                family_id, first_name, last_name, date_of_birth, school_name,
                level, grade, notes, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        ))
        .bind(input.family_id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.date_of_birth)
        .bind(clean_optional(&input.school_name))
        .bind(level.as_str())
        .bind(clean_optional(&input.grade))
        .bind(clean_optional(&input.notes))
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(student)
    }

    /// Find a student by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, RepositoryError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = $1",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// All students, or only those of one family
    pub async fn list(&self, family_id: Option<Uuid>) -> Result<Vec<Student>, RepositoryError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {} FROM students
            WHERE ($1::uuid IS NULL OR family_id = $1)
            ORDER BY last_name, first_name
            "#,
            STUDENT_COLUMNS
        ))
        .bind(family_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    /// Students among `ids` that belong to `family_id`
    pub async fn find_in_family(
        &self,
        family_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Student>, RepositoryError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE family_id = $1 AND id = ANY($2)",
            STUDENT_COLUMNS
        ))
        .bind(family_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: &StudentInput,
        level: SchoolLevel,
    ) -> Result<Option<Student>, RepositoryError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students
            SET family_id = $2,
                first_name = $3,
                last_name = $4,
                date_of_birth = $5,
                school_name = $6,
                level = $7,
                grade = $8,
                notes = $9,
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        ))
        .bind(id)
        .bind(input.family_id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.date_of_birth)
        .bind(clean_optional(&input.school_name))
        .bind(level.as_str())
        .bind(clean_optional(&input.grade))
        .bind(clean_optional(&input.notes))
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Delete a student. Fails on the foreign key when a settlement note
    /// or coupon series references it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE is_active")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
