// libs/appointment-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers::{self, AppState};

pub fn appointment_routes(state: AppState) -> Router {
    // Every route acts on behalf of the identity resolved by the middleware
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/stats", get(handlers::get_appointment_stats))
        .route("/{appointment_id}", get(handlers::get_appointment).patch(handlers::update_appointment))

        // Medicine delivery
        .route("/prescriptions/pending", get(handlers::get_pending_prescriptions))
        .route(
            "/prescriptions/{prescription_id}/delivery",
            patch(handlers::update_prescription_delivery),
        )

        // Live notices
        .route("/notifications/stream", get(handlers::notification_stream))

        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
