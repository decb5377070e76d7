use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::student;
use util::state::AppState;
use validator::Validate;

use super::{StudentRequest, student_error};
use crate::response::ApiResponse;
use crate::routes::common::{internal_error, not_found, validation_error};

/// PUT /api/students/{student_id}
///
/// Replaces the student ID, name and enrollment. Profile fields are left to the student.
pub async fn update_student(
    State(app_state): State<AppState>,
    Path(student_id): Path<i64>,
    Json(req): Json<StudentRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let db = app_state.db();

    let existing = match student::Model::find(db, student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => return not_found("Student"),
        Err(e) => return internal_error(e, "Failed to load student"),
    };

    match existing.reassign(db, req.into()).await {
        Ok(student) => (
            StatusCode::OK,
            Json(ApiResponse::success(student, "Student updated successfully")),
        )
            .into_response(),
        Err(e) => student_error(e),
    }
}
