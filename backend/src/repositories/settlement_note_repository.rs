use crate::error::RepositoryError;
use crate::models::settlement_note::format_note_number;
use crate::models::validation::clean_optional;
use crate::models::{
    coupon_code, CouponSeriesStatus, FamilyStatus, NewSettlementNote, NoteFinancials, PageParams,
    PaymentMethod, PaymentType, SettlementNote, SettlementNoteDetail, SettlementNoteStatus,
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;
use uuid::Uuid;

const NOTE_COLUMNS: &str = r#"
    id, number, family_id, client_name, department, payment_method, payment_type,
    subject_id, professor_id, hourly_rate, quantity, professor_salary, charges,
    total_amount, salary_to_pay, charges_to_pay, margin_amount, margin_percentage,
    status, due_date, paid_at, notes, created_by, created_at, updated_at
"#;

/// Everything needed to persist a note once the payload has been validated
/// and the family-derived fields resolved.
#[derive(Debug)]
pub struct NoteDraft<'a> {
    pub input: &'a NewSettlementNote,
    pub client_name: String,
    pub department: String,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub financials: NoteFinancials,
    pub created_by: Option<Uuid>,
}

/// Aggregates over every settlement note
#[derive(Debug, Clone, Default, FromRow)]
pub struct NoteTotals {
    pub note_count: i64,
    pub total_revenue: Decimal,
    pub total_margin: Decimal,
    pub outstanding_amount: Decimal,
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    family_id: Option<Uuid>,
    status: Option<SettlementNoteStatus>,
) {
    if let Some(family_id) = family_id {
        builder.push(" AND family_id = ").push_bind(family_id);
    }
    if let Some(status) = status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

/// Repository for settlement notes. Creation and deletion also maintain the
/// coupon series and the owning family's status in the same transaction.
pub struct SettlementNoteRepository {
    pool: PgPool,
}

impl SettlementNoteRepository {
    /// Create a new SettlementNoteRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the note, its student links and its coupon series, then
    /// promote the family to client. All or nothing.
    pub async fn create(&self, draft: NoteDraft<'_>) -> Result<SettlementNoteDetail, RepositoryError> {
        let input = draft.input;
        let first_student = *input.student_ids.first().ok_or_else(|| {
            RepositoryError::InvalidInput("at least one student is required".to_string())
        })?;

        let mut tx = self.pool.begin().await?;

        lock_family(&mut tx, input.family_id).await?;

        let sequence = sqlx::query_scalar::<_, i64>("SELECT nextval('settlement_note_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let number = format_note_number(Utc::now().year(), sequence);

        let financials = draft.financials;
        let note = sqlx::query_as::<_, SettlementNote>(&format!(
            r#"
            INSERT INTO settlement_notes (
                number, family_id, client_name, department, payment_method, payment_type,
                subject_id, professor_id, hourly_rate, quantity, professor_salary, charges,
                total_amount, salary_to_pay, charges_to_pay, margin_amount, margin_percentage,
                status, due_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(&number)
        .bind(input.family_id)
        .bind(&draft.client_name)
        .bind(&draft.department)
        .bind(draft.payment_method.as_str())
        .bind(draft.payment_type.as_str())
        .bind(input.subject_id)
        .bind(input.professor_id)
        .bind(input.hourly_rate)
        .bind(input.quantity)
        .bind(input.professor_salary)
        .bind(input.charges)
        .bind(financials.total_amount)
        .bind(financials.salary_to_pay)
        .bind(financials.charges_to_pay)
        .bind(financials.margin_amount)
        .bind(financials.margin_percentage)
        .bind(SettlementNoteStatus::Pending.as_str())
        .bind(input.due_date)
        .bind(clean_optional(&input.notes))
        .bind(draft.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO settlement_note_students (settlement_note_id, student_id)
            SELECT $1, UNNEST($2::uuid[])
            "#,
        )
        .bind(note.id)
        .bind(input.student_ids.as_slice())
        .execute(&mut *tx)
        .await?;

        let series_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO coupon_series (
                family_id, student_id, subject_id, settlement_note_id,
                total_coupons, hourly_rate, professor_salary, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(input.family_id)
        .bind(first_student)
        .bind(input.subject_id)
        .bind(note.id)
        .bind(input.quantity)
        .bind(input.hourly_rate)
        .bind(input.professor_salary)
        .bind(CouponSeriesStatus::Active.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let numbers: Vec<i32> = (1..=input.quantity).collect();
        let codes: Vec<String> = numbers.iter().map(|n| coupon_code(&series_id, *n)).collect();
        sqlx::query(
            r#"
            INSERT INTO coupons (series_id, code, number)
            SELECT $1, code, number
            FROM UNNEST($2::text[], $3::int[]) AS c(code, number)
            "#,
        )
        .bind(series_id)
        .bind(codes.as_slice())
        .bind(numbers.as_slice())
        .execute(&mut *tx)
        .await?;

        refresh_family_status(&mut tx, input.family_id).await?;

        tx.commit().await?;

        debug!(number = %note.number, coupons = input.quantity, "Settlement note stored");

        Ok(SettlementNoteDetail {
            note,
            student_ids: input.student_ids.clone(),
            coupon_series_id: Some(series_id),
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SettlementNote>, RepositoryError> {
        let note = sqlx::query_as::<_, SettlementNote>(&format!(
            "SELECT {} FROM settlement_notes WHERE id = $1",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    /// Note with its students and coupon series id
    pub async fn find_detail(
        &self,
        id: Uuid,
    ) -> Result<Option<SettlementNoteDetail>, RepositoryError> {
        let Some(note) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        self.detail(note).await.map(Some)
    }

    pub async fn detail(&self, note: SettlementNote) -> Result<SettlementNoteDetail, RepositoryError> {
        let student_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT student_id FROM settlement_note_students WHERE settlement_note_id = $1",
        )
        .bind(note.id)
        .fetch_all(&self.pool)
        .await?;

        let coupon_series_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM coupon_series WHERE settlement_note_id = $1",
        )
        .bind(note.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(SettlementNoteDetail {
            note,
            student_ids,
            coupon_series_id,
        })
    }

    /// Page through notes, newest first, with the total match count
    pub async fn list(
        &self,
        family_id: Option<Uuid>,
        status: Option<SettlementNoteStatus>,
        page: PageParams,
    ) -> Result<(Vec<SettlementNote>, i64), RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM settlement_notes WHERE 1 = 1",
            NOTE_COLUMNS
        ));
        push_filters(&mut query, family_id, status);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let notes = query
            .build_query_as::<SettlementNote>()
            .fetch_all(&self.pool)
            .await?;

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM settlement_notes WHERE 1 = 1");
        push_filters(&mut count, family_id, status);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok((notes, total))
    }

    pub async fn list_for_family(
        &self,
        family_id: Uuid,
    ) -> Result<Vec<SettlementNote>, RepositoryError> {
        let notes = sqlx::query_as::<_, SettlementNote>(&format!(
            "SELECT {} FROM settlement_notes WHERE family_id = $1 ORDER BY created_at DESC",
            NOTE_COLUMNS
        ))
        .bind(family_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    pub async fn count_for_family(&self, family_id: Uuid) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM settlement_notes WHERE family_id = $1",
        )
        .bind(family_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Update the non-financial fields; `None` keeps the stored value.
    /// `paid_at` is stamped when the note becomes paid and cleared when it
    /// leaves that status.
    pub async fn update(
        &self,
        id: Uuid,
        notes: Option<&str>,
        due_date: Option<chrono::NaiveDate>,
        payment_method: Option<PaymentMethod>,
        status: Option<SettlementNoteStatus>,
    ) -> Result<Option<SettlementNote>, RepositoryError> {
        let note = sqlx::query_as::<_, SettlementNote>(&format!(
            r#"
            UPDATE settlement_notes
            SET notes = COALESCE($2, notes),
                due_date = COALESCE($3, due_date),
                payment_method = COALESCE($4, payment_method),
                status = COALESCE($5, status),
                paid_at = CASE
                    WHEN $5::text IS NULL THEN paid_at
                    WHEN $5 = 'paid' THEN COALESCE(paid_at, NOW()::timestamp)
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(notes)
        .bind(due_date)
        .bind(payment_method.map(|m| m.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    /// Delete the note with its coupon series, then recompute the family
    /// status from the notes left. Refused once a coupon has been consumed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT family_id, number FROM settlement_notes WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((family_id, number)) = note else {
            return Ok(false);
        };

        lock_family(&mut tx, family_id).await?;

        let consumed = sqlx::query_scalar::<_, i32>(
            "SELECT used_coupons FROM coupon_series WHERE settlement_note_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0);

        if consumed > 0 {
            return Err(RepositoryError::BusinessRule(format!(
                "Settlement note {} has {} consumed coupon(s) and cannot be deleted",
                number, consumed
            )));
        }

        sqlx::query("DELETE FROM settlement_notes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        refresh_family_status(&mut tx, family_id).await?;

        tx.commit().await?;

        Ok(true)
    }

    pub async fn totals(&self) -> Result<NoteTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, NoteTotals>(
            r#"
            SELECT
                COUNT(*) AS note_count,
                COALESCE(SUM(total_amount), 0) AS total_revenue,
                COALESCE(SUM(margin_amount), 0) AS total_margin,
                COALESCE(SUM(total_amount) FILTER (WHERE status IN ('pending', 'overdue')), 0)
                    AS outstanding_amount
            FROM settlement_notes
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}

/// Take the family row lock that serialises note creation and deletion.
async fn lock_family(
    tx: &mut Transaction<'_, Postgres>,
    family_id: Uuid,
) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM families WHERE id = $1 FOR UPDATE")
        .bind(family_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Family {} not found", family_id)))?;

    Ok(())
}

/// Set the family status from its current note count.
async fn refresh_family_status(
    tx: &mut Transaction<'_, Postgres>,
    family_id: Uuid,
) -> Result<FamilyStatus, RepositoryError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM settlement_notes WHERE family_id = $1",
    )
    .bind(family_id)
    .fetch_one(&mut **tx)
    .await?;

    let status = FamilyStatus::from_settlement_note_count(count);
    sqlx::query(
        r#"
        UPDATE families
        SET status = $2, updated_at = NOW()
        WHERE id = $1 AND status <> $2
        "#,
    )
    .bind(family_id)
    .bind(status.as_str())
    .execute(&mut **tx)
    .await?;

    debug!(%family_id, notes = count, status = %status, "Family status refreshed");

    Ok(status)
}
