pub mod admin;
pub mod auth;
pub mod bookings;
pub mod errors;
pub mod services;
pub mod webhooks;

use {crate::state::AppState, axum::{routing::post, Router}};

pub fn router() -> Router<AppState> {
    let v1 = Router::new()
        .merge(bookings::router())
        .merge(admin::router())
        .merge(services::router())
        .route("/webhooks/{provider}", post(webhooks::handle));

    Router::new().nest("/v1", v1)
}
