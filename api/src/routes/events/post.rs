use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::event;
use util::state::AppState;
use validator::Validate;

use super::{EventRequest, event_error};
use crate::response::ApiResponse;
use crate::routes::common::{error_response, internal_error, not_found, validation_error};

/// POST /api/events
///
/// Creates an event with a fresh QR code. The event and its associations are written
/// together or not at all.
///
/// ### Request Body
/// ```json
/// {
///   "name": "Orientation",
///   "description": "Welcome session",
///   "date": "2025-10-01",
///   "time": "09:00",
///   "is_active": true,
///   "associations": [{ "course_id": 1, "section_id": 2 }]
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with `{ event, associations }`
/// - `400 Bad Request` on validation failure or a section outside its course
pub async fn create_event(
    State(app_state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let Some(input) = req.into_input() else {
        return error_response(StatusCode::BAD_REQUEST, "Time must be HH:MM or HH:MM:SS");
    };

    match event::Model::create(app_state.db(), input).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(created, "Event created successfully")),
        )
            .into_response(),
        Err(e) => event_error(e),
    }
}

/// POST /api/events/{event_id}/qr
///
/// Replaces the event's QR code. Codes printed before this call stop admitting new
/// check-ins; attendance already recorded is kept.
pub async fn regenerate_qr(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Response {
    let db = app_state.db();

    let existing = match event::Model::find(db, event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => return not_found("Event"),
        Err(e) => return internal_error(e, "Failed to load event"),
    };

    match existing.regenerate_qr(db).await {
        Ok(event) => (
            StatusCode::OK,
            Json(ApiResponse::success(event, "QR code regenerated successfully")),
        )
            .into_response(),
        Err(e) => event_error(e),
    }
}
