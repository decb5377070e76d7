use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::internal_error;

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/overview", get(get_overview))
}

/// GET /api/stats/overview
///
/// Row counts for the admin dashboard.
pub async fn get_overview(State(app_state): State<AppState>) -> Response {
    match db::stats::overview(app_state.db()).await {
        Ok(overview) => (
            StatusCode::OK,
            Json(ApiResponse::success(overview, "Overview retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to compute overview"),
    }
}
