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

/// PUT /api/events/{event_id}
///
/// Full replacement of the event's fields and association set. The QR code is kept.
pub async fn update_event(
    State(app_state): State<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<EventRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let Some(input) = req.into_input() else {
        return error_response(StatusCode::BAD_REQUEST, "Time must be HH:MM or HH:MM:SS");
    };
    let db = app_state.db();

    let existing = match event::Model::find(db, event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => return not_found("Event"),
        Err(e) => return internal_error(e, "Failed to load event"),
    };

    match existing.update(db, input).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(updated, "Event updated successfully")),
        )
            .into_response(),
        Err(e) => event_error(e),
    }
}
