use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::event;
use util::state::AppState;

use crate::response::{ApiResponse, Empty};
use crate::routes::common::{internal_error, not_found};

/// DELETE /api/events/{event_id}
///
/// Associations and attendance rows are deleted with the event.
pub async fn delete_event(State(app_state): State<AppState>, Path(event_id): Path<i64>) -> Response {
    match event::Model::delete_by_id(app_state.db(), event_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::success(Empty, "Event deleted successfully")),
        )
            .into_response(),
        Ok(false) => not_found("Event"),
        Err(e) => internal_error(e, "Failed to delete event"),
    }
}
