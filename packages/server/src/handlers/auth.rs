use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::user::{self, Role};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::files::BlobChanges;
use crate::handlers::user::{insert_user, user_responses};
use crate::models::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::models::envelope::{
    DataEnvelope, FieldErrorEnvelope, MessageEnvelope, message, ok,
};
use crate::models::user::{UserFields, UserResponse};
use crate::repository;
use crate::state::AppState;
use crate::utils::{hash, jwt};

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token and profile", body = LoginResponse),
        (status = 400, description = "Missing fields", body = FieldErrorEnvelope),
        (status = 401, description = "Invalid credentials", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<DataEnvelope<LoginResponse>>, AppError> {
    payload.validate().into_result()?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::Unauthorized(BAD_CREDENTIALS))?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS));
    }

    let auth = &state.config.auth;
    let access_token = jwt::sign(
        user.id,
        &user.email,
        &user.username,
        user.role,
        &auth.jwt_secret,
        auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    let user = user_responses(&state.db, vec![user])
        .await?
        .pop()
        .ok_or(AppError::Unauthorized(BAD_CREDENTIALS))?;

    info!(user_id = user.user_id, "User logged in");
    Ok(ok(LoginResponse { access_token, user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a customer account",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = MessageEnvelope),
        (status = 400, description = "Missing or malformed fields", body = FieldErrorEnvelope),
        (status = 409, description = "Email already registered", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let fields = UserFields::from(payload);
    fields.validate().into_result()?;

    let mut changes = BlobChanges::new();
    let user = insert_user(
        &state.db,
        &state.files,
        fields,
        Role::Customer,
        None,
        &mut changes,
    )
    .await?;
    state.files.sweep(changes).await;

    info!(user_id = user.id, "Customer registered");
    Ok(message("Registration successful"))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    operation_id = "profile",
    summary = "Profile of the logged-in user",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<UserResponse>>, AppError> {
    let user = repository::find_by_id::<user::Entity, _>(&state.db, auth_user.user_id, "User")
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized("Account no longer exists"),
            other => other,
        })?;
    let user = user_responses(&state.db, vec![user])
        .await?
        .pop()
        .ok_or(AppError::Unauthorized("Account no longer exists"))?;
    Ok(ok(user))
}
