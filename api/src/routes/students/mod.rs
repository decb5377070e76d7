//! `/students` routes (admin only).
//!
//! - `GET /students?course_id=&section_id=`, `POST /students`
//! - `GET|PUT|DELETE /students/{student_id}` (internal id)

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{Router, http::StatusCode, response::Response, routing::get};
use db::models::student::{StudentError, StudentInput};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::routes::common::{error_response, internal_error};

lazy_static::lazy_static! {
    static ref STUDENT_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

/// Body of both create and update.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentRequest {
    #[validate(
        length(min = 1, max = 64, message = "Student ID must be 1-64 characters"),
        regex(
            path = *STUDENT_ID_REGEX,
            message = "Student ID may contain letters, digits, '.', '_' and '-'"
        )
    )]
    pub student_id: String,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub course_id: i64,
    pub section_id: i64,
}

impl From<StudentRequest> for StudentInput {
    fn from(req: StudentRequest) -> Self {
        Self {
            student_id: req.student_id,
            name: req.name,
            course_id: req.course_id,
            section_id: req.section_id,
        }
    }
}

/// Enrollment mistakes are the caller's (400); a taken ID is a conflict.
fn student_error(err: StudentError) -> Response {
    match err {
        StudentError::UnknownCourse(_) | StudentError::SectionNotInCourse { .. } => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        StudentError::DuplicateStudentId(_) => error_response(StatusCode::CONFLICT, err.to_string()),
        StudentError::Database(e) => internal_error(e, "Failed to save student"),
    }
}

pub fn students_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_students).post(post::create_student))
        .route(
            "/{student_id}",
            get(get::get_student)
                .put(put::update_student)
                .delete(delete::delete_student),
        )
}
