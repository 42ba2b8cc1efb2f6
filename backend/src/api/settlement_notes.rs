use super::extract::{JsonBody, PathParam, QueryParams};
use crate::auth::Claims;
use crate::error::AppResult;
use crate::models::{
    NewSettlementNote, Page, PageParams, SettlementNote, SettlementNoteDetail,
    SettlementNoteFilter, SettlementNoteUpdate,
};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settlement-notes", get(list_notes).post(create_note))
        .route(
            "/settlement-notes/{id}",
            get(get_note).patch(update_note).delete(delete_note),
        )
        .route("/settlement-notes/{id}/mark-paid", post(mark_paid))
}

#[derive(Debug, Default, Deserialize)]
struct NoteListQuery {
    family_id: Option<Uuid>,
    status: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list_notes(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NoteListQuery>,
) -> AppResult<Json<Page<SettlementNote>>> {
    let filter = SettlementNoteFilter {
        family_id: query.family_id,
        status: query.status,
    };
    let page = PageParams::new(query.page, query.limit);
    Ok(Json(state.settlement_service.list(&filter, page).await?))
}

async fn get_note(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<SettlementNoteDetail>> {
    Ok(Json(state.settlement_service.get(id).await?))
}

async fn create_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(body): JsonBody<NewSettlementNote>,
) -> AppResult<(StatusCode, Json<SettlementNoteDetail>)> {
    let note = state.settlement_service.create(body, claims.sub).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

async fn update_note(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<SettlementNoteUpdate>,
) -> AppResult<Json<SettlementNoteDetail>> {
    Ok(Json(state.settlement_service.update(id, body).await?))
}

async fn mark_paid(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<SettlementNoteDetail>> {
    Ok(Json(state.settlement_service.mark_paid(id).await?))
}

async fn delete_note(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<StatusCode> {
    state.settlement_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
