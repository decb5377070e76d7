//! `/events` routes (admin only).
//!
//! - `GET /events`, `POST /events`
//! - `GET|PUT|DELETE /events/{event_id}`
//! - `POST /events/{event_id}/qr` issues a new check-in code
//! - `GET /events/{event_id}/attendance` lists who checked in

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use chrono::{NaiveDate, NaiveTime};
use db::models::event::{CourseSection, EventError, EventInput};
use serde::Deserialize;
use util::state::AppState;
use validator::{Validate, ValidationError};

use crate::routes::common::{error_response, internal_error};

fn default_active() -> bool {
    true
}

fn validate_time(raw: &str) -> Result<(), ValidationError> {
    parse_time(raw)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("time").with_message("Time must be HH:MM or HH:MM:SS".into()))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Body of both create and update.
#[derive(Debug, Deserialize, Validate)]
pub struct EventRequest {
    #[validate(length(min = 1, max = 200, message = "Event name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// `YYYY-MM-DD`
    pub date: NaiveDate,

    #[validate(custom(function = "validate_time"))]
    pub time: String,

    #[serde(default = "default_active")]
    pub is_active: bool,

    /// (course, section) pairs allowed to attend. May be empty.
    #[serde(default)]
    pub associations: Vec<CourseSection>,
}

impl EventRequest {
    /// Call after `validate()`.
    fn into_input(self) -> Option<EventInput> {
        Some(EventInput {
            time: parse_time(&self.time)?,
            name: self.name,
            description: self.description,
            date: self.date,
            is_active: self.is_active,
            associations: self.associations,
        })
    }
}

fn event_error(err: EventError) -> Response {
    match err {
        EventError::UnknownCourse(_) | EventError::SectionNotInCourse { .. } => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        other => internal_error(other, "Failed to save event"),
    }
}

pub fn events_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_events).post(post::create_event))
        .route(
            "/{event_id}",
            get(get::get_event)
                .put(put::update_event)
                .delete(delete::delete_event),
        )
        .route("/{event_id}/qr", post(post::regenerate_qr))
        .route("/{event_id}/attendance", get(get::get_roster))
}
