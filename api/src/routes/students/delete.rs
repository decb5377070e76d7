use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::student;
use util::state::AppState;

use crate::response::{ApiResponse, Empty};
use crate::routes::common::{internal_error, not_found};

/// DELETE /api/students/{student_id}
///
/// Also removes the student's account and attendance rows.
pub async fn delete_student(
    State(app_state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Response {
    match student::Model::delete_by_id(app_state.db(), student_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Student deleted successfully")),
        )
            .into_response(),
        Ok(false) => not_found("Student"),
        Err(e) => internal_error(e, "Failed to delete student"),
    }
}
