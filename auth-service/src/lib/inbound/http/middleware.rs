use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::auth::gatekeeper::authorize;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserProfile;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

const UNAUTHENTICATED: &str = "Unauthenticated";

/// Extension type to store the authenticated user in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub profile: UserProfile,
}

/// Middleware that admits bearer tokens and adds the user to request extensions.
///
/// Every rejection produces the same 401 response; the reason is only logged.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    // Owned: the request body is not Sync, so no borrow of `req` may live across the await.
    let token = extract_token_from_header(&req)
        .map(str::to_owned)
        .map_err(|reason| {
            tracing::warn!("Authentication rejected: {}", reason);
            unauthenticated()
        })?;

    let admission = state.gatekeeper.admit(&token).await.map_err(|e| {
        tracing::warn!("Authentication rejected: {}", e);
        unauthenticated()
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        profile: admission.profile,
    });

    Ok(next.run(req).await)
}

/// Middleware for routes reserved to admin and staff users.
///
/// Must run after `authenticate`.
pub async fn require_staff(req: Request, next: Next) -> Result<Response, Response> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(unauthenticated)?;

    authorize(&user.profile, &[Role::Admin, Role::Staff])
        .map_err(|e| ApiError::from(e).into_response())?;

    Ok(next.run(req).await)
}

fn unauthenticated() -> Response {
    ApiError::Unauthorized(UNAUTHENTICATED.to_string()).into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, &'static str> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;

    auth_str
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or("expected Authorization: Bearer <token>")
}
