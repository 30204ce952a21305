use axum::{extract::FromRequestParts, http::request::Parts};

use crate::entity::user::Role;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Returns `Ok(())` for Admin and SuperAdmin, `Err(Forbidden)` otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized("Authentication required"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized("Invalid or expired token"))?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token"))?;
        let role =
            Role::parse(&claims.role).ok_or(AppError::Unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
            username: claims.username,
            role,
        })
    }
}

/// An [`AuthUser`] whose role is Admin or SuperAdmin.
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(AdminUser(user))
    }
}
