//! `POST /attendance/checkin`.
//!
//! One endpoint, two callers: a student scanning a QR code sends `{ "qr_payload" }`, an
//! admin entering a student by hand sends `{ "student_id", "event_id" }`. Both drive the
//! same in/out state machine.

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use db::models::attendance::{self, CheckInError};
use db::models::user::Role;
use serde::Deserialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{current_student, error_response, internal_error};

pub fn attendance_routes() -> Router<AppState> {
    Router::new().route("/checkin", post(check_in))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CheckInRequest {
    Qr { qr_payload: String },
    Manual { student_id: String, event_id: i64 },
}

fn check_in_error(err: CheckInError) -> Response {
    let status = match &err {
        CheckInError::AlreadyComplete | CheckInError::EventInactive => StatusCode::CONFLICT,
        CheckInError::EventNotFound(_) | CheckInError::UnknownStudentId(_) => StatusCode::NOT_FOUND,
        CheckInError::NotEligible | CheckInError::QrDisabled => StatusCode::FORBIDDEN,
        CheckInError::InvalidQrCode | CheckInError::StaleQrCode => StatusCode::BAD_REQUEST,
        CheckInError::Database(_) => return internal_error(err, "Check-in failed"),
    };
    error_response(status, err.to_string())
}

/// POST /api/attendance/checkin
///
/// ### Request Body
/// Student:
/// ```json
/// { "qr_payload": "eyJldmVudF9pZCI6MSwiaXNzdWVkX2F0IjoxNzI3NzcwMDAwMDAwMDAwfQ" }
/// ```
/// Admin:
/// ```json
/// { "student_id": "2024-0001", "event_id": 1 }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ state: "in" | "out", record }`
/// - `400 Bad Request` for an unreadable or superseded QR code
/// - `403 Forbidden` for the wrong role, an ineligible student, or QR check-in switched off
/// - `404 Not Found` for an unknown student or event
/// - `409 Conflict` when attendance is already complete or the event is inactive
pub async fn check_in(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<CheckInRequest>,
) -> Response {
    let db = app_state.db();

    let result = match req {
        CheckInRequest::Qr { qr_payload } => {
            if user.role != Role::Student {
                return error_response(
                    StatusCode::FORBIDDEN,
                    "Only students can check in with a QR code",
                );
            }
            let student = match current_student(db, &user).await {
                Ok(student) => student,
                Err(response) => return response,
            };
            attendance::Model::check_in_by_qr(db, &qr_payload, &student).await
        }
        CheckInRequest::Manual {
            student_id,
            event_id,
        } => {
            if user.role != Role::Admin {
                return error_response(StatusCode::FORBIDDEN, "Admin access required");
            }
            attendance::Model::check_in_manual(db, &student_id, event_id).await
        }
    };

    match result {
        Ok(outcome) => {
            let message = match outcome.state {
                attendance::CheckInState::In => "Checked in successfully",
                attendance::CheckInState::Out => "Checked out successfully",
            };
            (StatusCode::OK, Json(ApiResponse::success(outcome, message))).into_response()
        }
        Err(e) => check_in_error(e),
    }
}
