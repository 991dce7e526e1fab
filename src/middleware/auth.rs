use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{Error, Result},
    models::identity::{Identity, ADMIN_ROLE},
    AppState,
};

/// Admits only callers whose bearer token resolves to a user holding the
/// admin role. The resolved [`Identity`] is stored in request extensions.
pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authorize_admin(&state, req.headers()).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authorize_admin(state: &AppState, headers: &HeaderMap) -> Result<Identity> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        tracing::warn!("Request without authorization header");
        return Err(Error::Unauthorized("No authorization header".into()));
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Authorization header is not a bearer token");
            Error::Unauthorized("Invalid token".into())
        })?;

    let identity = state.identity.resolve_user(token).await.map_err(|e| {
        tracing::warn!(error = %e, "Invalid token");
        Error::Unauthorized("Invalid token".into())
    })?;

    let is_admin = match state.identity.has_role(&identity, ADMIN_ROLE).await {
        Ok(is_admin) => is_admin,
        Err(e) => {
            tracing::error!(user_id = %identity.user_id, error = %e, "Role lookup failed");
            false
        }
    };
    if !is_admin {
        tracing::warn!(user_id = %identity.user_id, "User is not an admin");
        return Err(Error::Forbidden("Admin role required".into()));
    }

    tracing::info!(user_id = %identity.user_id, "Authorized admin user");
    Ok(identity)
}
