use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::TypedHeader;
use db::models::user;
use headers::{Authorization, authorization::Bearer};
use serde::{Deserialize, Serialize};

use super::decode_jwt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Internal user id.
    pub sub: i64,
    pub exp: usize,
}

/// The caller's current user row, inserted into request extensions by the guards.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// Pulls verified claims out of the `Authorization: Bearer` header.
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    (
                        StatusCode::UNAUTHORIZED,
                        "Missing or invalid Authorization header",
                    )
                })?;

        decode_jwt(bearer.token())
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))
    }
}
