use super::extract::{JsonBody, PathParam, QueryParams};
use crate::auth::Claims;
use crate::error::AppResult;
use crate::models::{
    Family, FamilyDetail, FamilyFilter, FamilyInput, NextActionInput, Page, PageParams,
    ProspectStatusInput, SettlementNote, Student,
};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/families", get(list_families).post(create_family))
        .route("/families/reminders", get(reminders))
        .route(
            "/families/{id}",
            get(get_family).put(update_family).delete(delete_family),
        )
        .route("/families/{id}/prospect-status", patch(update_prospect_status))
        .route("/families/{id}/next-action", patch(update_next_action))
        .route("/families/{id}/students", get(family_students))
        .route("/families/{id}/settlement-notes", get(family_settlement_notes))
}

#[derive(Debug, Default, Deserialize)]
struct FamilyListQuery {
    status: Option<String>,
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReminderQuery {
    before: Option<NaiveDate>,
}

async fn list_families(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FamilyListQuery>,
) -> AppResult<Json<Page<Family>>> {
    let filter = FamilyFilter {
        status: query.status,
        search: query.search,
    };
    let page = PageParams::new(query.page, query.limit);
    Ok(Json(state.family_service.list(&filter, page).await?))
}

async fn get_family(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<FamilyDetail>> {
    Ok(Json(state.family_service.get_detail(id).await?))
}

async fn create_family(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(body): JsonBody<FamilyInput>,
) -> AppResult<(StatusCode, Json<Family>)> {
    let family = state.family_service.create(body, claims.sub).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

async fn update_family(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<FamilyInput>,
) -> AppResult<Json<Family>> {
    Ok(Json(state.family_service.update(id, body).await?))
}

async fn delete_family(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<StatusCode> {
    state.family_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_prospect_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<ProspectStatusInput>,
) -> AppResult<Json<Family>> {
    Ok(Json(state.family_service.update_prospect_status(id, body).await?))
}

async fn update_next_action(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<NextActionInput>,
) -> AppResult<Json<Family>> {
    Ok(Json(state.family_service.update_next_action(id, body).await?))
}

/// Prospects due for a call back; `before` defaults to today
async fn reminders(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ReminderQuery>,
) -> AppResult<Json<Vec<Family>>> {
    let before = query.before.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.family_service.reminders(before).await?))
}

async fn family_students(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<Vec<Student>>> {
    Ok(Json(state.student_service.list_for_family(id).await?))
}

async fn family_settlement_notes(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<Vec<SettlementNote>>> {
    Ok(Json(state.settlement_service.list_for_family(id).await?))
}
