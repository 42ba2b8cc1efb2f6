//! Service-level tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a server where the test user may
//! create databases, then `cargo test -- --ignored`.

mod helpers;

use abc_crm_backend::config::BootstrapAdmin;
use abc_crm_backend::error::AppError;
use abc_crm_backend::models::*;
use abc_crm_backend::services::LoginRequest;
use helpers::*;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

struct Fixtures {
    admin: User,
    family: Family,
    student: Student,
    subject: Subject,
}

async fn fixtures(app: &TestApp) -> Fixtures {
    let admin = app.create_user("admin@abc-cours.test", UserRole::Admin).await;
    let family = app.create_family(admin.id).await;
    let student = app.create_student(family.id, "Lucas").await;
    let subject = app.create_subject("Mathématiques").await;
    Fixtures {
        admin,
        family,
        student,
        subject,
    }
}

async fn family_status(app: &TestApp, id: Uuid) -> FamilyStatus {
    let family = assert_ok!(app.state.family_service.get(id).await);
    family.status_enum()
}

// ============================================================================
// Schema
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_migrations_ran(pool: PgPool) {
    let tables = [
        "users",
        "subjects",
        "families",
        "students",
        "professors",
        "professor_subjects",
        "settlement_notes",
        "settlement_note_students",
        "coupon_series",
        "coupons",
    ];

    for table in tables {
        let exists: bool = sqlx::query(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .expect("Query failed")
        .get(0);
        assert!(exists, "Table {} should exist", table);
    }
}

// ============================================================================
// Settlement notes and coupons
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_settlement_note_creates_series_and_promotes_family(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    assert_eq!(fx.family.status_enum(), FamilyStatus::Prospect);

    let detail = assert_ok!(
        app.state
            .settlement_service
            .create(
                note_input(fx.family.id, fx.subject.id, vec![fx.student.id]),
                fx.admin.id,
            )
            .await
    );

    let note = &detail.note;
    assert!(note.number.starts_with("NDR-"));
    assert_eq!(note.client_name, "Sophie MARTIN");
    assert_eq!(note.department, "69");
    assert_eq!(note.total_amount, Decimal::new(400, 0));
    assert_eq!(note.salary_to_pay, Decimal::new(180, 0));
    assert_eq!(note.charges_to_pay, Decimal::new(70, 0));
    assert_eq!(note.margin_amount, Decimal::new(150, 0));
    assert_eq!(note.margin_percentage, Decimal::new(3750, 2));
    assert_eq!(note.status_enum(), SettlementNoteStatus::Pending);
    assert_eq!(detail.student_ids, vec![fx.student.id]);

    assert_eq!(family_status(&app, fx.family.id).await, FamilyStatus::Client);

    let series_id = detail.coupon_series_id.expect("Series should exist");
    let series = assert_ok!(app.state.coupon_service.get_series(series_id).await);
    assert_eq!(series.series.total_coupons, 10);
    assert_eq!(series.series.remaining_coupons, 10);
    assert_eq!(series.series.student_id, fx.student.id);
    assert_eq!(series.coupons.len(), 10);
    assert_eq!(series.coupons[0].number, 1);
    assert_eq!(series.coupons[0].code, coupon_code(&series_id, 1));
    assert!(series.coupons.iter().all(|c| c.is_available()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_note_numbers_are_unique(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let detail = assert_ok!(
            app.state
                .settlement_service
                .create(
                    note_input(fx.family.id, fx.subject.id, vec![fx.student.id]),
                    fx.admin.id,
                )
                .await
        );
        numbers.push(detail.note.number);
    }

    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_note_rejects_student_of_other_family(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    let other_family = app.create_family(fx.admin.id).await;
    let outsider = app.create_student(other_family.id, "Emma").await;

    let result = app
        .state
        .settlement_service
        .create(
            note_input(fx.family.id, fx.subject.id, vec![fx.student.id, outsider.id]),
            fx.admin.id,
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(family_status(&app, fx.family.id).await, FamilyStatus::Prospect);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_note_unknown_references(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;

    let result = app
        .state
        .settlement_service
        .create(
            note_input(Uuid::new_v4(), fx.subject.id, vec![fx.student.id]),
            fx.admin.id,
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = app
        .state
        .settlement_service
        .create(
            note_input(fx.family.id, Uuid::new_v4(), vec![fx.student.id]),
            fx.admin.id,
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_deleting_last_note_reverts_family_to_prospect(pool: PgPool) {
    let app = TestApp::from_pool(pool.clone());
    let fx = fixtures(&app).await;
    let service = &app.state.settlement_service;

    let first = assert_ok!(
        service
            .create(note_input(fx.family.id, fx.subject.id, vec![fx.student.id]), fx.admin.id)
            .await
    );
    let second = assert_ok!(
        service
            .create(note_input(fx.family.id, fx.subject.id, vec![fx.student.id]), fx.admin.id)
            .await
    );

    assert_ok!(service.delete(first.note.id).await);
    assert_eq!(family_status(&app, fx.family.id).await, FamilyStatus::Client);

    assert_ok!(service.delete(second.note.id).await);
    assert_eq!(family_status(&app, fx.family.id).await, FamilyStatus::Prospect);

    let coupons: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
        .fetch_one(&pool)
        .await
        .expect("Query failed");
    assert_eq!(coupons, 0);

    assert!(matches!(
        service.delete(first.note.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_coupon_consumption_completes_series(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    let professor = app
        .create_professor("claire@abc-cours.test", vec![fx.subject.id])
        .await;

    let mut input = note_input(fx.family.id, fx.subject.id, vec![fx.student.id]);
    input.quantity = 2;
    let detail = assert_ok!(app.state.settlement_service.create(input, fx.admin.id).await);
    let series_id = detail.coupon_series_id.expect("Series should exist");
    let coupons = assert_ok!(
        app.state
            .coupon_service
            .list_coupons(&CouponFilter {
                series_id: Some(series_id),
                status: None,
            })
            .await
    );
    assert_eq!(coupons.len(), 2);

    let used = assert_ok!(
        app.state
            .coupon_service
            .use_coupon(
                coupons[0].id,
                UseCouponInput {
                    professor_id: Some(professor.id),
                    session_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 14),
                    notes: Some("Fractions".to_string()),
                },
            )
            .await
    );
    assert_eq!(used.status_enum(), CouponStatus::Used);
    assert_eq!(used.professor_id, Some(professor.id));
    assert!(used.used_at.is_some());

    let err = assert_err!(
        app.state
            .coupon_service
            .use_coupon(coupons[0].id, UseCouponInput::default())
            .await
    );
    assert!(matches!(err, AppError::Conflict(_)));

    let series = assert_ok!(app.state.coupon_service.get_series(series_id).await).series;
    assert_eq!(series.used_coupons, 1);
    assert_eq!(series.remaining_coupons, 1);
    assert!(series.is_active());

    let cancelled = assert_ok!(app.state.coupon_service.cancel_coupon(coupons[1].id).await);
    assert_eq!(cancelled.status_enum(), CouponStatus::Cancelled);
    assert!(cancelled.used_at.is_none());

    let series = assert_ok!(app.state.coupon_service.get_series(series_id).await).series;
    assert_eq!(series.remaining_coupons, 0);
    assert_eq!(series.status_enum(), CouponSeriesStatus::Completed);

    let stats = assert_ok!(app.state.dashboard_service.stats().await);
    assert_eq!(stats.remaining_coupons, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_note_with_used_coupons_cannot_be_deleted(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;

    let detail = assert_ok!(
        app.state
            .settlement_service
            .create(note_input(fx.family.id, fx.subject.id, vec![fx.student.id]), fx.admin.id)
            .await
    );
    let series_id = detail.coupon_series_id.expect("Series should exist");
    let series = assert_ok!(app.state.coupon_service.get_series(series_id).await);
    assert_ok!(
        app.state
            .coupon_service
            .use_coupon(series.coupons[0].id, UseCouponInput::default())
            .await
    );

    let err = assert_err!(app.state.settlement_service.delete(detail.note.id).await);
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(family_status(&app, fx.family.id).await, FamilyStatus::Client);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_mark_paid_and_update(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    let service = &app.state.settlement_service;

    let detail = assert_ok!(
        service
            .create(note_input(fx.family.id, fx.subject.id, vec![fx.student.id]), fx.admin.id)
            .await
    );

    let updated = assert_ok!(
        service
            .update(
                detail.note.id,
                SettlementNoteUpdate {
                    payment_method: Some("check".to_string()),
                    notes: Some("Paid in two installments".to_string()),
                    ..SettlementNoteUpdate::default()
                },
            )
            .await
    );
    assert_eq!(updated.note.payment_method, "check");
    assert_eq!(updated.note.total_amount, detail.note.total_amount);
    assert!(updated.note.paid_at.is_none());

    let paid = assert_ok!(service.mark_paid(detail.note.id).await);
    assert!(paid.note.is_paid());
    assert!(paid.note.paid_at.is_some());

    let stats = assert_ok!(app.state.dashboard_service.stats().await);
    assert_eq!(stats.settlement_note_count, 1);
    assert_eq!(stats.total_revenue, Decimal::new(400, 0));
    assert_eq!(stats.outstanding_amount, Decimal::ZERO);
    assert_eq!(stats.client_count, 1);
    assert_eq!(stats.prospect_count, 0);
}

// ============================================================================
// Families
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_family_with_notes_cannot_be_deleted(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;

    assert_ok!(
        app.state
            .settlement_service
            .create(note_input(fx.family.id, fx.subject.id, vec![fx.student.id]), fx.admin.id)
            .await
    );

    let err = assert_err!(app.state.family_service.delete(fx.family.id).await);
    assert!(matches!(err, AppError::Conflict(_)));

    let empty = app.create_family(fx.admin.id).await;
    app.create_student(empty.id, "Léa").await;
    assert_ok!(app.state.family_service.delete(empty.id).await);
    assert!(assert_ok!(app.state.student_service.list(Some(empty.id)).await).is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_family_listing_and_search(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    assert_ok!(
        app.state
            .family_service
            .create(family_input("Bernard"), fx.admin.id)
            .await
    );

    let all = assert_ok!(
        app.state
            .family_service
            .list(&FamilyFilter::default(), PageParams::default())
            .await
    );
    assert_eq!(all.total, 2);

    let found = assert_ok!(
        app.state
            .family_service
            .list(
                &FamilyFilter {
                    status: None,
                    search: Some("bern".to_string()),
                },
                PageParams::default(),
            )
            .await
    );
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].contact_last_name, "Bernard");

    let first_page = assert_ok!(
        app.state
            .family_service
            .list(&FamilyFilter::default(), PageParams::new(Some(1), Some(1)))
            .await
    );
    assert_eq!(first_page.items.len(), 1);
    assert_eq!(first_page.total_pages, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_follow_up_reminders(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    let today = chrono::Utc::now().date_naive();

    assert_ok!(
        app.state
            .family_service
            .update_next_action(
                fx.family.id,
                NextActionInput {
                    date: Some(today - chrono::Duration::days(1)),
                    note: Some("Call back about maths".to_string()),
                },
            )
            .await
    );

    let due = assert_ok!(app.state.family_service.reminders(today).await);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, fx.family.id);

    let earlier = assert_ok!(
        app.state
            .family_service
            .reminders(today - chrono::Duration::days(5))
            .await
    );
    assert!(earlier.is_empty());
}

// ============================================================================
// Professors and subjects
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_professor_subjects(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let maths = app.create_subject("Mathématiques").await;
    let english = app.create_subject("Anglais").await;
    let professor = app
        .create_professor("claire@abc-cours.test", vec![maths.id])
        .await;

    let teaching_english = assert_ok!(
        app.state
            .professor_service
            .list(&ProfessorFilter {
                subject_id: Some(english.id),
                status: None,
            })
            .await
    );
    assert!(teaching_english.is_empty());

    let updated = assert_ok!(
        app.state
            .professor_service
            .set_subjects(
                professor.id,
                ProfessorSubjectsInput {
                    subject_ids: vec![english.id, maths.id],
                },
            )
            .await
    );
    assert_eq!(updated.subjects.len(), 2);

    let err = assert_err!(
        app.state
            .professor_service
            .set_subjects(
                professor.id,
                ProfessorSubjectsInput {
                    subject_ids: vec![Uuid::new_v4()],
                },
            )
            .await
    );
    assert!(matches!(err, AppError::Validation(_)));

    let duplicate = app
        .state
        .professor_service
        .create(ProfessorInput {
            first_name: "Paul".to_string(),
            last_name: "Durand".to_string(),
            email: "CLAIRE@abc-cours.test".to_string(),
            ..ProfessorInput::default()
        })
        .await;
    match duplicate {
        Err(AppError::Conflict(msg)) => {
            assert_eq!(msg, "A professor with this email already exists")
        }
        other => panic!("Expected conflict, got {:?}", other.map(|p| p.professor.id)),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_subject_in_use_cannot_be_deleted(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let fx = fixtures(&app).await;
    assert_ok!(
        app.state
            .settlement_service
            .create(note_input(fx.family.id, fx.subject.id, vec![fx.student.id]), fx.admin.id)
            .await
    );

    let err = assert_err!(app.state.subject_service.delete(fx.subject.id).await);
    assert!(matches!(err, AppError::Conflict(_)));

    let unused = app.create_subject("Physique").await;
    assert_ok!(app.state.subject_service.delete(unused.id).await);
}

// ============================================================================
// Users and authentication
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_bootstrap_admin_and_login(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let admin = BootstrapAdmin {
        email: "Direction@abc-cours.test".to_string(),
        password: "s3cret-password".to_string(),
    };

    let created = assert_ok!(app.state.auth_service.ensure_bootstrap_admin(&admin).await);
    let created = created.expect("Admin should be created on an empty table");
    assert_eq!(created.email, "direction@abc-cours.test");
    assert!(created.is_admin());

    let again = assert_ok!(app.state.auth_service.ensure_bootstrap_admin(&admin).await);
    assert!(again.is_none());

    let response = assert_ok!(
        app.state
            .auth_service
            .login(LoginRequest {
                email: "DIRECTION@abc-cours.test".to_string(),
                password: "s3cret-password".to_string(),
            })
            .await
    );
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.user.id, created.id);
    let claims = assert_ok!(app.state.jwt.verify(&response.access_token));
    assert_eq!(claims.sub, created.id);

    let err = assert_err!(
        app.state
            .auth_service
            .login(LoginRequest {
                email: "direction@abc-cours.test".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
    );
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_user_management(pool: PgPool) {
    let app = TestApp::from_pool(pool);
    let admin = app.create_user("admin@abc-cours.test", UserRole::Admin).await;

    let staff = assert_ok!(
        app.state
            .user_service
            .create(NewUser {
                email: "staff@abc-cours.test".to_string(),
                password: "long enough".to_string(),
                first_name: "Nina".to_string(),
                last_name: "Petit".to_string(),
                role: None,
            })
            .await
    );
    assert_eq!(staff.role_enum(), UserRole::Staff);

    let duplicate = app
        .state
        .user_service
        .create(NewUser {
            email: "STAFF@abc-cours.test".to_string(),
            password: "long enough".to_string(),
            first_name: "Nina".to_string(),
            last_name: "Petit".to_string(),
            role: None,
        })
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let err = assert_err!(app.state.user_service.delete(admin.id, admin.id).await);
    assert!(matches!(err, AppError::Conflict(_)));

    assert_ok!(app.state.user_service.delete(admin.id, staff.id).await);
    assert_eq!(assert_ok!(app.state.user_service.list().await).len(), 1);
}
