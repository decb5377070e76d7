use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{course, section};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::response::{ApiResponse, Empty};
use crate::routes::common::{db_error, internal_error, not_found, validation_error};

const DUPLICATE_SECTION: &str = "A section with this name already exists in the course";

#[derive(Debug, Deserialize, Validate)]
pub struct SectionRequest {
    #[validate(length(min = 1, max = 50, message = "Section name must be 1-50 characters"))]
    pub name: String,
}

async fn require_course(db: &DatabaseConnection, course_id: i64) -> Result<(), Response> {
    match course::Model::find(db, course_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(not_found("Course")),
        Err(e) => Err(internal_error(e, "Failed to load course")),
    }
}

async fn require_section(
    db: &DatabaseConnection,
    course_id: i64,
    section_id: i64,
) -> Result<section::Model, Response> {
    match section::Model::find_in_course(db, course_id, section_id).await {
        Ok(Some(section)) => Ok(section),
        Ok(None) => Err(not_found("Section")),
        Err(e) => Err(internal_error(e, "Failed to load section")),
    }
}

/// GET /api/courses/{course_id}/sections
pub async fn list_sections(
    State(app_state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Response {
    let db = app_state.db();
    if let Err(response) = require_course(db, course_id).await {
        return response;
    }

    match section::Model::list_for_course(db, course_id).await {
        Ok(sections) => (
            StatusCode::OK,
            Json(ApiResponse::success(sections, "Sections retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to list sections"),
    }
}

/// POST /api/courses/{course_id}/sections
///
/// ```json
/// { "name": "A" }
/// ```
pub async fn create_section(
    State(app_state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(req): Json<SectionRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let db = app_state.db();
    if let Err(response) = require_course(db, course_id).await {
        return response;
    }

    match section::Model::create(db, course_id, &req.name).await {
        Ok(section) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(section, "Section created successfully")),
        )
            .into_response(),
        Err(e) => db_error(e, DUPLICATE_SECTION, "Section is still in use"),
    }
}

/// PUT /api/courses/{course_id}/sections/{section_id}
pub async fn rename_section(
    State(app_state): State<AppState>,
    Path((course_id, section_id)): Path<(i64, i64)>,
    Json(req): Json<SectionRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let db = app_state.db();
    let existing = match require_section(db, course_id, section_id).await {
        Ok(section) => section,
        Err(response) => return response,
    };

    match existing.rename(db, &req.name).await {
        Ok(section) => (
            StatusCode::OK,
            Json(ApiResponse::success(section, "Section updated successfully")),
        )
            .into_response(),
        Err(e) => db_error(e, DUPLICATE_SECTION, "Section is still in use"),
    }
}

/// DELETE /api/courses/{course_id}/sections/{section_id}
///
/// Refused with `409` while students are still in the section.
pub async fn delete_section(
    State(app_state): State<AppState>,
    Path((course_id, section_id)): Path<(i64, i64)>,
) -> Response {
    let db = app_state.db();
    if let Err(response) = require_section(db, course_id, section_id).await {
        return response;
    }

    match section::Model::delete_by_id(db, section_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Section deleted successfully")),
        )
            .into_response(),
        Err(e) => db_error(
            e,
            "Section conflicts with existing data",
            "Section still has enrolled students",
        ),
    }
}
