//! `/courses` routes (admin only), with sections nested under each course.
//!
//! - `GET /courses`, `POST /courses`
//! - `GET|PUT|DELETE /courses/{course_id}`
//! - `GET|POST /courses/{course_id}/sections`
//! - `PUT|DELETE /courses/{course_id}/sections/{section_id}`

pub mod delete;
pub mod get;
pub mod post;
pub mod put;
pub mod sections;

use axum::{
    Router,
    routing::{get, put},
};
use util::state::AppState;

pub fn courses_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_courses).post(post::create_course))
        .route(
            "/{course_id}",
            get(get::get_course)
                .put(put::edit_course)
                .delete(delete::delete_course),
        )
        .route(
            "/{course_id}/sections",
            get(sections::list_sections).post(sections::create_section),
        )
        .route(
            "/{course_id}/sections/{section_id}",
            put(sections::rename_section).delete(sections::delete_section),
        )
}
