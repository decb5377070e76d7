use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::course;
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::{db_error, internal_error, not_found, validation_error};

#[derive(Debug, Deserialize, Validate)]
pub struct EditCourseRequest {
    #[validate(length(min = 1, max = 100, message = "Course name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

/// PUT /api/courses/{course_id}
///
/// Partial update; omitted fields keep their value.
pub async fn edit_course(
    State(app_state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(req): Json<EditCourseRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let db = app_state.db();

    let existing = match course::Model::find(db, course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => return not_found("Course"),
        Err(e) => return internal_error(e, "Failed to load course"),
    };

    match existing
        .edit(db, req.name.as_deref(), req.description.as_deref().map(Some))
        .await
    {
        Ok(course) => (
            StatusCode::OK,
            Json(ApiResponse::success(course, "Course updated successfully")),
        )
            .into_response(),
        Err(e) => db_error(
            e,
            "A course with this name already exists",
            "Course is still in use",
        ),
    }
}
