use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{course, section};
use serde::Serialize;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::{internal_error, not_found};

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    pub course: course::Model,
    pub sections: Vec<section::Model>,
}

/// GET /api/courses
pub async fn list_courses(State(app_state): State<AppState>) -> Response {
    match course::Model::list(app_state.db()).await {
        Ok(courses) => (
            StatusCode::OK,
            Json(ApiResponse::success(courses, "Courses retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to list courses"),
    }
}

/// GET /api/courses/{course_id}
///
/// The course with its sections.
pub async fn get_course(
    State(app_state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Response {
    let db = app_state.db();

    let course = match course::Model::find(db, course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => return not_found("Course"),
        Err(e) => return internal_error(e, "Failed to load course"),
    };

    match section::Model::list_for_course(db, course_id).await {
        Ok(sections) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                CourseDetail { course, sections },
                "Course retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to list sections"),
    }
}
