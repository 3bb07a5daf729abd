pub mod handlers;
pub mod models;
pub mod router;
pub mod seed;
pub mod services;

pub use handlers::AppState;
pub use models::*;
pub use router::appointment_routes;
pub use services::*;
