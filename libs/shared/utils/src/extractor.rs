use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Resolves the acting user from the identity headers and stores it in the
/// request extensions for handlers to pick up with `Extension<User>`.
pub async fn identity_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = user_from_headers(request.headers())?;
    debug!("Resolved identity {} ({})", user.id, user.role);

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn user_from_headers(headers: &HeaderMap) -> Result<User, AppError> {
    let id = required_header(headers, USER_ID_HEADER)?;
    let role = required_header(headers, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(AppError::Auth)?;
    let name = required_header(headers, USER_NAME_HEADER)?;

    Ok(User { id, name, role })
}

// Function to extract user from request extensions
pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, AppError> {
    let value = headers
        .get(name)
        .ok_or_else(|| AppError::Auth(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| AppError::Auth(format!("Invalid {} header format", name)))?
        .trim();

    if value.is_empty() {
        return Err(AppError::Auth(format!("Empty {} header", name)));
    }

    Ok(value.to_string())
}
