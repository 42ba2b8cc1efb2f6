mod helpers;

use abc_crm_backend::build_router;
use abc_crm_backend::config::BootstrapAdmin;
use axum::http::{Method, StatusCode};
use axum::Router;
use helpers::*;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = body.map(|b| b.to_string());
    let response = app
        .clone()
        .oneshot(request(method, uri, token, body.as_deref()))
        .await
        .expect("Router failed");
    read_json(response).await
}

/// Login → family → student → settlement note → coupon use → dashboard
#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_complete_e2e_flow(pool: PgPool) {
    let test_app = TestApp::from_pool(pool);
    test_app
        .state
        .auth_service
        .ensure_bootstrap_admin(&BootstrapAdmin {
            email: "direction@abc-cours.test".to_string(),
            password: "s3cret-password".to_string(),
        })
        .await
        .expect("Failed to seed admin");
    let app = build_router(test_app.state.clone());

    // Step 1: Login
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "direction@abc-cours.test", "password": "s3cret-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().expect("Missing token").to_string();
    let token = Some(token.as_str());

    let (status, me) = call(&app, Method::GET, "/api/auth/me", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "admin");
    assert!(me.get("password_hash").is_none());

    // Step 2: Family, student and subject
    let (status, family) = call(
        &app,
        Method::POST,
        "/api/families",
        token,
        Some(json!({
            "contact_first_name": "Sophie",
            "contact_last_name": "Martin",
            "contact_phone": "0601020304",
            "postal_code": "13008",
            "prospect_status": "interested",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(family["status"], "prospect");
    let family_id = family["id"].as_str().expect("Missing id").to_string();

    let (status, student) = call(
        &app,
        Method::POST,
        "/api/students",
        token,
        Some(json!({
            "family_id": family_id,
            "first_name": "Lucas",
            "last_name": "Martin",
            "level": "middle_school",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, subject) = call(
        &app,
        Method::POST,
        "/api/subjects",
        token,
        Some(json!({"name": "Anglais", "category": "languages"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Step 3: Settlement note
    let (status, note) = call(
        &app,
        Method::POST,
        "/api/settlement-notes",
        token,
        Some(json!({
            "family_id": family_id,
            "subject_id": subject["id"],
            "student_ids": [student["id"]],
            "payment_method": "cesu",
            "payment_type": "tax_credit",
            "hourly_rate": "35",
            "quantity": 3,
            "professor_salary": "15",
            "charges": "5",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["department"], "13");
    let series_id = note["coupon_series_id"].as_str().expect("Missing series").to_string();

    let (status, family) = call(
        &app,
        Method::GET,
        &format!("/api/families/{}", family_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(family["status"], "client");
    assert_eq!(family["settlement_note_count"], 1);

    // Step 4: Use a coupon
    let (status, series) = call(
        &app,
        Method::GET,
        &format!("/api/coupon-series/{}", series_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(series["remaining_coupons"], 3);
    let coupon_id = series["coupons"][0]["id"].as_str().expect("Missing coupon").to_string();

    let (status, coupon) = call(
        &app,
        Method::POST,
        &format!("/api/coupons/{}/use", coupon_id),
        token,
        Some(json!({"session_date": "2025-03-14"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(coupon["status"], "used");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/coupons/{}/use", coupon_id),
        token,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Step 5: Dashboard
    let (status, stats) = call(&app, Method::GET, "/api/dashboard/stats", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["client_count"], 1);
    assert_eq!(stats["student_count"], 1);
    assert_eq!(stats["remaining_coupons"], 2);

    // Step 6: Notes with used coupons stay
    let note_id = note["id"].as_str().expect("Missing note id");
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/settlement-notes/{}", note_id),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, Method::GET, "/health/db", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
