use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Authenticated caller identity. Session management lives in the
/// upstream gateway; it validates the bearer token and forwards the
/// resolved user id in `x-user-id`, which is all this service trusts.
#[derive(Clone, Copy)]
pub struct UserId(pub Uuid);

pub async fn require_auth(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok());

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(UserId(user_id));
            Ok(next.run(request).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
