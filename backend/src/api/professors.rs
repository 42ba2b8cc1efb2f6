use super::extract::{JsonBody, PathParam, QueryParams};
use crate::auth::{require_admin, Claims};
use crate::error::AppResult;
use crate::models::{ProfessorFilter, ProfessorInput, ProfessorSubjectsInput, ProfessorWithSubjects};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/professors", get(list_professors).post(create_professor))
        .route(
            "/professors/{id}",
            get(get_professor).put(update_professor).delete(delete_professor),
        )
        .route("/professors/{id}/subjects", put(set_subjects))
}

async fn list_professors(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<ProfessorFilter>,
) -> AppResult<Json<Vec<ProfessorWithSubjects>>> {
    Ok(Json(state.professor_service.list(&filter).await?))
}

async fn get_professor(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<ProfessorWithSubjects>> {
    Ok(Json(state.professor_service.get(id).await?))
}

async fn create_professor(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ProfessorInput>,
) -> AppResult<(StatusCode, Json<ProfessorWithSubjects>)> {
    let professor = state.professor_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(professor)))
}

async fn update_professor(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<ProfessorInput>,
) -> AppResult<Json<ProfessorWithSubjects>> {
    Ok(Json(state.professor_service.update(id, body).await?))
}

async fn set_subjects(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<ProfessorSubjectsInput>,
) -> AppResult<Json<ProfessorWithSubjects>> {
    Ok(Json(state.professor_service.set_subjects(id, body).await?))
}

async fn delete_professor(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&claims)?;
    state.professor_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
