use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{attendance, event};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::{internal_error, not_found};

/// GET /api/events
///
/// All events, newest first.
pub async fn list_events(State(app_state): State<AppState>) -> Response {
    match event::Model::list(app_state.db()).await {
        Ok(events) => (
            StatusCode::OK,
            Json(ApiResponse::success(events, "Events retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to list events"),
    }
}

/// GET /api/events/{event_id}
///
/// `{ event, associations }`
pub async fn get_event(State(app_state): State<AppState>, Path(event_id): Path<i64>) -> Response {
    match event::Model::find_with_associations(app_state.db(), event_id).await {
        Ok(Some(event)) => (
            StatusCode::OK,
            Json(ApiResponse::success(event, "Event retrieved successfully")),
        )
            .into_response(),
        Ok(None) => not_found("Event"),
        Err(e) => internal_error(e, "Failed to load event"),
    }
}

/// GET /api/events/{event_id}/attendance
///
/// Roster of `{ attendance, student }` entries in check-in order.
pub async fn get_roster(State(app_state): State<AppState>, Path(event_id): Path<i64>) -> Response {
    let db = app_state.db();

    match event::Model::find(db, event_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("Event"),
        Err(e) => return internal_error(e, "Failed to load event"),
    }

    match attendance::Model::roster(db, event_id).await {
        Ok(roster) => (
            StatusCode::OK,
            Json(ApiResponse::success(roster, "Attendance retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to load attendance"),
    }
}
