use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth;
use crate::error::ApiError;
use crate::handlers::AppState;
use crate::rpc::Session;

/// Session-resolving middleware applied to every route.
///
/// An absent Authorization header means anonymous: `None` is attached and
/// the request proceeds, leaving each procedure to decide whether it needs
/// a caller. A header that is present but malformed, expired, or bound to
/// a user that no longer exists fails `UNAUTHENTICATED` outright.
///
/// Roles are re-read from the store here on every request, so a grant or
/// revocation takes effect on the holder's next call.
pub async fn resolve_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = match bearer_token(&headers)? {
        None => None,
        Some(token) => {
            let claims = auth::verify_token(&token)
                .map_err(|e| ApiError::unauthenticated(format!("invalid session token: {}", e)))?;

            let user = state
                .store
                .find_user(claims.sub)
                .await?
                .ok_or_else(|| ApiError::unauthenticated("session user no longer exists"))?;
            let roles = state.store.user_roles(user.id).await?;

            Some(Session { user, roles })
        }
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthenticated("malformed Authorization header"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(ApiError::unauthenticated("expected a Bearer session token")),
    }
}
