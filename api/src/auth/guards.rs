//! Route guards.
//!
//! Each guard verifies the bearer token, loads the current user row and stores it as an
//! [`AuthUser`] extension for the handler. Role checks are exact: an admin is not a student.

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user::{self, Role};
use util::state::AppState;

use crate::auth::claims::{AuthUser, Claims};
use crate::response::{ApiResponse, Empty};

type GuardRejection = (StatusCode, Json<ApiResponse<Empty>>);

fn reject(status: StatusCode, message: &str) -> GuardRejection {
    (status, Json(ApiResponse::error(message)))
}

/// Resolves the caller and inserts them into the request extensions.
async fn authenticate(
    app_state: &AppState,
    req: Request<Body>,
) -> Result<(Request<Body>, user::Model), GuardRejection> {
    let (mut parts, body) = req.into_parts();

    let claims = Claims::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Authentication required"))?;

    // The token only names a user; the row decides whether they still exist and what role they hold.
    let user = match user::Model::find(app_state.db(), claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(reject(StatusCode::UNAUTHORIZED, "User no longer exists")),
        Err(e) => {
            tracing::error!(error = %e, user_id = claims.sub, "Failed to load user for request");
            return Err(reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ));
        }
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(AuthUser(user.clone()));
    Ok((req, user))
}

async fn allow_role(
    app_state: &AppState,
    req: Request<Body>,
    next: Next,
    role: Role,
    failure_msg: &str,
) -> Result<Response, GuardRejection> {
    let (req, user) = authenticate(app_state, req).await?;
    if user.role != role {
        return Err(reject(StatusCode::FORBIDDEN, failure_msg));
    }
    Ok(next.run(req).await)
}

/// Any signed-in user.
pub async fn allow_authenticated(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (req, _user) = authenticate(&app_state, req).await?;
    Ok(next.run(req).await)
}

/// Admin-only guard.
pub async fn allow_admin(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_role(&app_state, req, next, Role::Admin, "Admin access required").await
}

/// Student-only guard.
pub async fn allow_student(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_role(&app_state, req, next, Role::Student, "Student access required").await
}
