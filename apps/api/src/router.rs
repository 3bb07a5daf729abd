use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "MedioKart API is running!" }))
        .nest("/appointments", appointment_routes(state))
}
