use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::student;
use serde::Deserialize;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::{internal_error, not_found};

#[derive(Debug, Deserialize, Default)]
pub struct ListStudentsQuery {
    pub course_id: Option<i64>,
    pub section_id: Option<i64>,
}

/// GET /api/students
///
/// Each entry is `{ student, course, section }`. Optional `course_id` and `section_id`
/// query parameters narrow the list.
pub async fn list_students(
    State(app_state): State<AppState>,
    Query(query): Query<ListStudentsQuery>,
) -> Response {
    match student::Model::list_with_enrollment(app_state.db(), query.course_id, query.section_id)
        .await
    {
        Ok(students) => (
            StatusCode::OK,
            Json(ApiResponse::success(students, "Students retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to list students"),
    }
}

/// GET /api/students/{student_id}
pub async fn get_student(
    State(app_state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Response {
    match student::Model::find_enrollment(app_state.db(), student_id).await {
        Ok(Some(student)) => (
            StatusCode::OK,
            Json(ApiResponse::success(student, "Student retrieved successfully")),
        )
            .into_response(),
        Ok(None) => not_found("Student"),
        Err(e) => internal_error(e, "Failed to load student"),
    }
}
