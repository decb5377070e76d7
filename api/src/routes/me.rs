//! `/me` routes: a student's view of themselves. Student accounts only.

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use db::models::{
    attendance, event,
    student::{self, ProfileUpdate, StudentWithEnrollment},
    user::Role,
};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::common::{current_student, internal_error, not_found, validation_error};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/events", get(get_events))
        .route("/attendance", get(get_attendance))
        .route("/stats", get(get_stats))
}

#[derive(Debug, Serialize)]
pub struct AccountInfo {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub account: AccountInfo,
    #[serde(flatten)]
    pub enrollment: StudentWithEnrollment,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(range(min = 1, max = 150, message = "Age must be between 1 and 150"))]
    pub age: Option<i32>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub birthday: Option<NaiveDate>,

    #[validate(length(max = 2048, message = "Profile picture reference is too long"))]
    pub profile_picture: Option<String>,
}

async fn enrollment_of(
    db: &sea_orm::DatabaseConnection,
    student: student::Model,
) -> Result<StudentWithEnrollment, Response> {
    match student.with_enrollment(db).await {
        Ok(Some(enrollment)) => Ok(enrollment),
        Ok(None) => Err(not_found("Enrollment")),
        Err(e) => Err(internal_error(e, "Failed to load enrollment")),
    }
}

/// GET /api/me
///
/// `{ account, student, course, section }`
pub async fn get_profile(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Response {
    let db = app_state.db();
    let student = match current_student(db, &user).await {
        Ok(student) => student,
        Err(response) => return response,
    };
    let enrollment = match enrollment_of(db, student).await {
        Ok(enrollment) => enrollment,
        Err(response) => return response,
    };

    let body = ProfileResponse {
        account: AccountInfo {
            id: user.id,
            email: user.email,
            role: user.role,
        },
        enrollment,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(body, "Profile retrieved successfully")),
    )
        .into_response()
}

/// PUT /api/me
///
/// Updates the student's own profile fields. Omitted fields are left as they are. The
/// login email is not changed by this call.
pub async fn update_profile(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }
    let db = app_state.db();
    let student = match current_student(db, &user).await {
        Ok(student) => student,
        Err(response) => return response,
    };

    let update = ProfileUpdate {
        age: req.age,
        email: req.email.map(|e| e.trim().to_lowercase()),
        birthday: req.birthday,
        profile_picture: req.profile_picture,
    };

    match student.update_profile(db, update).await {
        Ok(student) => (
            StatusCode::OK,
            Json(ApiResponse::success(student, "Profile updated successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to update profile"),
    }
}

/// GET /api/me/events
///
/// Events open to the student's course and section, each with the student's own
/// attendance record (or `null`).
pub async fn get_events(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Response {
    let db = app_state.db();
    let student = match current_student(db, &user).await {
        Ok(student) => student,
        Err(response) => return response,
    };

    match event::Model::visible_to(db, &student).await {
        Ok(events) => (
            StatusCode::OK,
            Json(ApiResponse::success(events, "Events retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to list visible events"),
    }
}

/// GET /api/me/attendance
pub async fn get_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Response {
    let db = app_state.db();
    let student = match current_student(db, &user).await {
        Ok(student) => student,
        Err(response) => return response,
    };

    match attendance::Model::history(db, student.id).await {
        Ok(history) => (
            StatusCode::OK,
            Json(ApiResponse::success(history, "Attendance retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to load attendance history"),
    }
}

/// GET /api/me/stats
pub async fn get_stats(
    State(app_state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Response {
    let db = app_state.db();
    let student = match current_student(db, &user).await {
        Ok(student) => student,
        Err(response) => return response,
    };

    match attendance::Model::stats_for(db, &student).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(stats, "Statistics retrieved successfully")),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to compute statistics"),
    }
}
