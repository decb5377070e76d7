use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use db::models::user::{self, AuthError, RegisterError, Registration, Role};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::routes::common::{error_response, internal_error, validation_error};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64, message = "Student ID is required"))]
    pub student_id: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(range(min = 1, max = 150, message = "Age must be between 1 and 150"))]
    pub age: Option<i32>,

    pub birthday: Option<NaiveDate>,

    #[validate(length(max = 2048, message = "Profile picture reference is too long"))]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub token: String,
    pub expires_at: String,
}

fn with_token(user: user::Model) -> Result<AuthResponse, Response> {
    let (token, expires_at) =
        generate_jwt(user.id).map_err(|e| internal_error(e, "Token encoding failed"))?;
    Ok(AuthResponse {
        id: user.id,
        email: user.email,
        role: user.role,
        student_id: user.student_id,
        token,
        expires_at,
    })
}

/// POST /api/auth/register
///
/// Creates a student account for a student record an admin has already added, filling
/// in the profile fields on that record.
///
/// ### Request Body
/// ```json
/// {
///   "student_id": "2024-0001",
///   "email": "ada@example.com",
///   "password": "strongpassword",
///   "age": 20,
///   "birthday": "2004-12-10",
///   "profile_picture": "https://cdn.example.com/ada.png"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with `{ id, email, role, student_id, token, expires_at }`
/// - `400 Bad Request` on validation failure
/// - `404 Not Found` when no student has that ID
/// - `409 Conflict` when the email or the student already has an account
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }

    let registration = Registration {
        student_id: req.student_id,
        email: req.email,
        password: req.password,
        age: req.age,
        birthday: req.birthday,
        profile_picture: req.profile_picture,
    };

    match user::Model::register(app_state.db(), registration).await {
        Ok((user, _student)) => match with_token(user) {
            Ok(body) => (
                StatusCode::CREATED,
                Json(ApiResponse::success(body, "User registered successfully")),
            )
                .into_response(),
            Err(response) => response,
        },
        Err(err @ RegisterError::UnknownStudentId(_)) => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        Err(err @ (RegisterError::EmailAlreadyRegistered
        | RegisterError::StudentAlreadyRegistered(_))) => {
            error_response(StatusCode::CONFLICT, err.to_string())
        }
        Err(err) => internal_error(err, "Registration failed"),
    }
}

/// POST /api/auth/login
///
/// ### Request Body
/// ```json
/// { "email": "ada@example.com", "password": "strongpassword" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ id, email, role, student_id, token, expires_at }`
/// - `401 Unauthorized` with `"Invalid email or password"`, whichever part was wrong
pub async fn login(State(app_state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }

    match user::Model::verify_credentials(app_state.db(), &req.email, &req.password).await {
        Ok(user) => match with_token(user) {
            Ok(body) => (
                StatusCode::OK,
                Json(ApiResponse::success(body, "Login successful")),
            )
                .into_response(),
            Err(response) => response,
        },
        Err(err @ AuthError::InvalidCredentials) => {
            error_response(StatusCode::UNAUTHORIZED, err.to_string())
        }
        Err(err) => internal_error(err, "Login failed"),
    }
}
