//! Response helpers shared by the route handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::format_validation_errors;
use db::models::{student, user};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use std::fmt::Display;
use validator::ValidationErrors;

use crate::response::{ApiResponse, Empty};

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<Empty>::error(message))).into_response()
}

/// Logs `err` and answers with a generic 500; internal detail never reaches the client.
pub fn internal_error(err: impl Display, context: &str) -> Response {
    tracing::error!(error = %err, "{context}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

pub fn validation_error(errors: &ValidationErrors) -> Response {
    error_response(StatusCode::BAD_REQUEST, format_validation_errors(errors))
}

/// Maps constraint violations to 409 and everything else to a logged 500.
///
/// `conflict` is the message for a uniqueness clash, `in_use` for a row that other rows
/// still reference.
pub fn db_error(err: DbErr, conflict: &str, in_use: &str) -> Response {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => error_response(StatusCode::CONFLICT, conflict),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            error_response(StatusCode::CONFLICT, in_use)
        }
        _ => internal_error(err, "Database operation failed"),
    }
}

pub fn not_found(what: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// The student record behind a student account.
pub async fn current_student(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<student::Model, Response> {
    match user.student(db).await {
        Ok(Some(student)) => Ok(student),
        Ok(None) => Err(not_found("Student record")),
        Err(e) => Err(internal_error(e, "Failed to load student record")),
    }
}
