//! Bearer token authentication and admin gating.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::UserRole;
use crate::errors::AppError;

/// Authenticated caller, decoded from the bearer token.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Validate the bearer token and insert the [`CurrentUser`] extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_token(token)?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        role: UserRole::from(claims.role.as_str()),
    });

    Ok(next.run(request).await)
}

/// Reject non-admin callers. Must run after [`auth_middleware`].
///
/// The role is read from the store, not the token, so promotions and
/// demotions apply to tokens already issued.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller_id = request
        .extensions()
        .get::<CurrentUser>()
        .map(|caller| caller.id)
        .ok_or(AppError::Unauthorized)?;

    let user = match state.user_service.get_user(caller_id).await {
        Ok(user) => user,
        Err(AppError::UserNotFound) => return Err(AppError::Unauthorized),
        Err(e) => return Err(e),
    };
    let current = CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    };
    require_admin(&current)?;

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, "Non-admin tried an admin route");
        Err(AppError::Forbidden)
    }
}
