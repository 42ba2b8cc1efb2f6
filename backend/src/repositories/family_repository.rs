use crate::error::RepositoryError;
use crate::models::validation::clean_optional;
use crate::models::{Family, FamilyInput, FamilyStatus, PageParams, ProspectStatus};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const FAMILY_COLUMNS: &str = r#"
    id, contact_first_name, contact_last_name, contact_email, contact_phone,
    street, postal_code, city, status, prospect_status, source, notes,
    next_action_date, next_action_note, created_by, created_at, updated_at
"#;

/// Escape LIKE wildcards so user input is matched literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    status: Option<FamilyStatus>,
    search: Option<&str>,
) {
    if let Some(status) = status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = search {
        let pattern = like_pattern(search);
        builder.push(" AND (");
        let columns = [
            "contact_first_name",
            "contact_last_name",
            "contact_email",
            "contact_phone",
            "city",
        ];
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder
                .push(*column)
                .push(" ILIKE ")
                .push_bind(pattern.clone());
        }
        builder.push(")");
    }
}

/// Repository for families (prospects and clients)
pub struct FamilyRepository {
    pool: PgPool,
}

impl FamilyRepository {
    /// Create a new FamilyRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new family. Every family starts as a prospect.
    pub async fn create(
        &self,
        input: &FamilyInput,
        prospect_status: Option<ProspectStatus>,
        created_by: Option<Uuid>,
    ) -> Result<Family, RepositoryError> {
        let family = sqlx::query_as::<_, Family>(&format!(
            r#"
            INSERT INTO families (
                contact_first_name, contact_last_name, contact_email, contact_phone,
                street, postal_code, city, status, prospect_status, source, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            FAMILY_COLUMNS
        ))
        .bind(input.contact_first_name.trim())
        .bind(input.contact_last_name.trim())
        .bind(clean_optional(&input.contact_email).map(|e| e.to_lowercase()))
        .bind(input.contact_phone.trim())
        .bind(clean_optional(&input.street))
        .bind(clean_optional(&input.postal_code))
        .bind(clean_optional(&input.city))
        .bind(FamilyStatus::Prospect.as_str())
        .bind(prospect_status.map(|s| s.as_str()))
        .bind(clean_optional(&input.source))
        .bind(clean_optional(&input.notes))
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(family)
    }

    /// Find a family by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Family>, RepositoryError> {
        let family = sqlx::query_as::<_, Family>(&format!(
            "SELECT {} FROM families WHERE id = $1",
            FAMILY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    /// Page through families, newest first, with the total match count
    pub async fn list(
        &self,
        status: Option<FamilyStatus>,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<(Vec<Family>, i64), RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM families WHERE 1 = 1",
            FAMILY_COLUMNS
        ));
        push_filters(&mut query, status, search);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let families = query
            .build_query_as::<Family>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM families WHERE 1 = 1");
        push_filters(&mut count, status, search);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok((families, total))
    }

    /// Replace the editable fields. Status is left untouched.
    pub async fn update(
        &self,
        id: Uuid,
        input: &FamilyInput,
        prospect_status: Option<ProspectStatus>,
    ) -> Result<Option<Family>, RepositoryError> {
        let family = sqlx::query_as::<_, Family>(&format!(
            r#"
            UPDATE families
            SET contact_first_name = $2,
                contact_last_name = $3,
                contact_email = $4,
                contact_phone = $5,
                street = $6,
                postal_code = $7,
                city = $8,
                prospect_status = $9,
                source = $10,
                notes = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FAMILY_COLUMNS
        ))
        .bind(id)
        .bind(input.contact_first_name.trim())
        .bind(input.contact_last_name.trim())
        .bind(clean_optional(&input.contact_email).map(|e| e.to_lowercase()))
        .bind(input.contact_phone.trim())
        .bind(clean_optional(&input.street))
        .bind(clean_optional(&input.postal_code))
        .bind(clean_optional(&input.city))
        .bind(prospect_status.map(|s| s.as_str()))
        .bind(clean_optional(&input.source))
        .bind(clean_optional(&input.notes))
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    pub async fn update_prospect_status(
        &self,
        id: Uuid,
        prospect_status: Option<ProspectStatus>,
    ) -> Result<Option<Family>, RepositoryError> {
        let family = sqlx::query_as::<_, Family>(&format!(
            r#"
            UPDATE families
            SET prospect_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FAMILY_COLUMNS
        ))
        .bind(id)
        .bind(prospect_status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    pub async fn update_next_action(
        &self,
        id: Uuid,
        date: Option<NaiveDate>,
        note: Option<&str>,
    ) -> Result<Option<Family>, RepositoryError> {
        let family = sqlx::query_as::<_, Family>(&format!(
            r#"
            UPDATE families
            SET next_action_date = $2, next_action_note = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FAMILY_COLUMNS
        ))
        .bind(id)
        .bind(date)
        .bind(note)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    /// Prospects whose next action is due on or before `before`
    pub async fn find_due_reminders(
        &self,
        before: NaiveDate,
    ) -> Result<Vec<Family>, RepositoryError> {
        let families = sqlx::query_as::<_, Family>(&format!(
            r#"
            SELECT {} FROM families
            WHERE status = $1
                AND next_action_date IS NOT NULL
                AND next_action_date <= $2
            ORDER BY next_action_date ASC
            "#,
            FAMILY_COLUMNS
        ))
        .bind(FamilyStatus::Prospect.as_str())
        .bind(before)
        .fetch_all(&self.pool)
        .await?;

        Ok(families)
    }

    /// Delete a family and its students. Fails on the foreign key when
    /// settlement notes still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM families WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of families per status: `(prospects, clients)`
    pub async fn count_by_status(&self) -> Result<(i64, i64), RepositoryError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'prospect'),
                COUNT(*) FILTER (WHERE status = 'client')
            FROM families
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}
