use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::student;
use util::state::AppState;
use validator::Validate;

use super::{StudentRequest, student_error};
use crate::response::ApiResponse;
use crate::routes::common::validation_error;

/// POST /api/students
///
/// Pre-registers a student so they can later create an account.
///
/// ### Request Body
/// ```json
/// { "student_id": "2024-0001", "name": "Ada Lovelace", "course_id": 1, "section_id": 2 }
/// ```
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` on validation failure or a section outside the course
/// - `409 Conflict` when the student ID is taken
pub async fn create_student(
    State(app_state): State<AppState>,
    Json(req): Json<StudentRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }

    match student::Model::create(app_state.db(), req.into()).await {
        Ok(student) => {
            tracing::info!(student_id = %student.student_id, "Student pre-registered");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(student, "Student created successfully")),
            )
                .into_response()
        }
        Err(e) => student_error(e),
    }
}
