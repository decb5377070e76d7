//! `/settings`: public read, admin write.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::system_settings::{self, DEFAULT_SYSTEM_NAME, SettingsUpdate};
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::{Validate, ValidationError};

use crate::response::ApiResponse;
use crate::routes::common::{internal_error, validation_error};

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub system_name: String,
    pub qr_code_enabled: bool,
    /// `None` until the settings have been saved once.
    pub updated_at: Option<String>,
}

impl From<system_settings::Model> for SettingsResponse {
    fn from(s: system_settings::Model) -> Self {
        Self {
            system_name: s.system_name,
            qr_code_enabled: s.qr_code_enabled,
            updated_at: Some(s.updated_at.to_rfc3339()),
        }
    }
}

impl Default for SettingsResponse {
    fn default() -> Self {
        Self {
            system_name: DEFAULT_SYSTEM_NAME.to_owned(),
            qr_code_enabled: true,
            updated_at: None,
        }
    }
}

fn validate_system_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if (1..=100).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("system_name")
            .with_message("System name must be 1-100 characters".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    /// Checked after trimming; the stored name is trimmed too.
    #[validate(custom(function = "validate_system_name"))]
    pub system_name: Option<String>,
    pub qr_code_enabled: Option<bool>,
}

/// GET /api/settings
///
/// Stored settings, or the defaults when none have been saved.
pub async fn get_settings(State(app_state): State<AppState>) -> Response {
    match system_settings::Model::get(app_state.db()).await {
        Ok(settings) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                settings.map(SettingsResponse::from).unwrap_or_default(),
                "Settings retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => internal_error(e, "Failed to load settings"),
    }
}

/// PUT /api/settings
///
/// ### Request Body
/// ```json
/// { "system_name": "Campus Attendance", "qr_code_enabled": false }
/// ```
/// Both fields are optional. The first call creates the settings row; later calls update it.
pub async fn update_settings(
    State(app_state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_error(&errors);
    }

    let update = SettingsUpdate {
        system_name: req.system_name,
        qr_code_enabled: req.qr_code_enabled,
    };

    match system_settings::Model::upsert(app_state.db(), update).await {
        Ok(settings) => {
            tracing::info!(qr_code_enabled = settings.qr_code_enabled, "Settings updated");
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SettingsResponse::from(settings),
                    "Settings updated successfully",
                )),
            )
                .into_response()
        }
        Err(e) => internal_error(e, "Failed to save settings"),
    }
}
