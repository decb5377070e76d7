//! HTTP routes under `/api`.
//!
//! Route groups and who may call them:
//! - `/health` → public
//! - `/auth` → public (register, login)
//! - `/settings` → public `GET`, admin `PUT`
//! - `/courses`, `/students`, `/events`, `/stats` → admin
//! - `/attendance` → any signed-in user; the handler checks the role per request shape
//! - `/me` → student

use axum::{
    Router,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::get,
};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_authenticated, allow_student};
use crate::routes::{
    attendance::attendance_routes, auth::auth_routes, courses::courses_routes,
    events::events_routes, health::health_routes, me::me_routes, stats::stats_routes,
    students::students_routes,
};

pub mod attendance;
pub mod auth;
pub mod common;
pub mod courses;
pub mod events;
pub mod health;
pub mod me;
pub mod settings;
pub mod stats;
pub mod students;

/// Builds the `/api` router with every group mounted and its guard applied.
pub fn routes(app_state: AppState) -> Router {
    let admin = from_fn_with_state(app_state.clone(), allow_admin);

    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings.layer(admin.clone())),
        )
        .nest("/courses", courses_routes().route_layer(admin.clone()))
        .nest("/students", students_routes().route_layer(admin.clone()))
        .nest("/events", events_routes().route_layer(admin.clone()))
        .nest("/stats", stats_routes().route_layer(admin))
        .nest(
            "/attendance",
            attendance_routes()
                .route_layer(from_fn_with_state(app_state.clone(), allow_authenticated)),
        )
        .nest(
            "/me",
            me_routes().route_layer(from_fn_with_state(app_state.clone(), allow_student)),
        )
        .with_state(app_state)
}
