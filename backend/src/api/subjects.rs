use super::extract::{JsonBody, PathParam, QueryParams};
use crate::auth::{require_admin, Claims};
use crate::error::AppResult;
use crate::models::{Subject, SubjectFilter, SubjectInput};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(list_subjects).post(create_subject))
        .route(
            "/subjects/{id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
}

async fn list_subjects(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<SubjectFilter>,
) -> AppResult<Json<Vec<Subject>>> {
    Ok(Json(state.subject_service.list(filter.active).await?))
}

async fn get_subject(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<Subject>> {
    Ok(Json(state.subject_service.get(id).await?))
}

async fn create_subject(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SubjectInput>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    let subject = state.subject_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

async fn update_subject(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<SubjectInput>,
) -> AppResult<Json<Subject>> {
    Ok(Json(state.subject_service.update(id, body).await?))
}

async fn delete_subject(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&claims)?;
    state.subject_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
