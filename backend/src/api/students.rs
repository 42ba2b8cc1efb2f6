use super::extract::{JsonBody, PathParam, QueryParams};
use crate::error::AppResult;
use crate::models::{Student, StudentFilter, StudentInput};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}

async fn list_students(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<StudentFilter>,
) -> AppResult<Json<Vec<Student>>> {
    Ok(Json(state.student_service.list(filter.family_id).await?))
}

async fn get_student(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.student_service.get(id).await?))
}

async fn create_student(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StudentInput>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = state.student_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn update_student(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(body): JsonBody<StudentInput>,
) -> AppResult<Json<Student>> {
    Ok(Json(state.student_service.update(id, body).await?))
}

async fn delete_student(
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<StatusCode> {
    state.student_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
