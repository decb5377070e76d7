use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::course;
use util::state::AppState;

use crate::response::{ApiResponse, Empty};
use crate::routes::common::{db_error, not_found};

/// DELETE /api/courses/{course_id}
///
/// Sections and event associations go with the course. Refused with `409` while
/// students are still enrolled in it.
pub async fn delete_course(
    State(app_state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Response {
    match course::Model::delete_by_id(app_state.db(), course_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Course deleted successfully")),
        )
            .into_response(),
        Ok(false) => not_found("Course"),
        Err(e) => db_error(
            e,
            "Course conflicts with existing data",
            "Course still has enrolled students",
        ),
    }
}
