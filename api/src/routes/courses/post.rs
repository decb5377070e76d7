use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::course;
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::{db_error, validation_error};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 100, message = "Course name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// POST /api/courses
///
/// ### Request Body
/// ```json
/// { "name": "BSCS", "description": "Computer Science" }
/// ```
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` on validation failure
/// - `409 Conflict` when the name is taken
pub async fn create_course(
    State(app_state): State<AppState>,
    Json(req): Json<CreateCourseRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }

    match course::Model::create(app_state.db(), &req.name, req.description.as_deref()).await {
        Ok(course) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(course, "Course created successfully")),
        )
            .into_response(),
        Err(e) => db_error(
            e,
            "A course with this name already exists",
            "Course is still in use",
        ),
    }
}
