//! Account routes backed by the user pool.
//!
//! Request bodies use snake_case fields. Token responses pass the provider's
//! `AuthenticationResult` through unchanged.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use cognito::models::AuthenticationResult;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domains::auth::{ADMIN_GROUP, DEFAULT_GROUP};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmSignUp {
    pub email: String,
    pub confirmation_code: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmForgotPassword {
    pub email: String,
    pub confirmation_code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub access_token: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignOut {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub sub: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub roles: Vec<String>,
}

pub async fn sign_up_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let output = state.identity.sign_up(&body.email, &body.password).await?;
    info!(email = %body.email, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            sub: output.user_sub,
        }),
    ))
}

/// Confirm the account, then add it to the default group.
///
/// A failed group assignment is logged; the confirmation itself stands.
pub async fn confirm_sign_up_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<ConfirmSignUp>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .identity
        .confirm_sign_up(&body.email, &body.confirmation_code)
        .await?;

    if let Err(e) = state
        .identity
        .add_user_to_group(&body.email, DEFAULT_GROUP)
        .await
    {
        warn!(email = %body.email, group = DEFAULT_GROUP, error = %e, "Could not assign default group");
    }

    Ok(MessageResponse::new("Account confirmed successfully"))
}

pub async fn resend_confirmation_code_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.identity.resend_confirmation_code(&query.email).await?;
    Ok(MessageResponse::new("Confirmation code resent successfully"))
}

pub async fn sign_in_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<AuthenticationResult>, ApiError> {
    let tokens = state.identity.sign_in(&body.email, &body.password).await?;
    Ok(Json(tokens))
}

pub async fn refresh_token_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AuthenticationResult>, ApiError> {
    let tokens = state.identity.refresh(&body.refresh_token).await?;
    Ok(Json(tokens))
}

pub async fn forgot_password_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.identity.forgot_password(&query.email).await?;
    Ok(MessageResponse::new(
        "Password reset code sent to your email address",
    ))
}

pub async fn confirm_forgot_password_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<ConfirmForgotPassword>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .identity
        .confirm_forgot_password(&body.email, &body.confirmation_code, &body.new_password)
        .await?;
    Ok(MessageResponse::new("Password reset successful"))
}

pub async fn change_password_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<ChangePassword>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .identity
        .change_password(&body.access_token, &body.old_password, &body.new_password)
        .await?;
    Ok(MessageResponse::new("Password changed successfully"))
}

pub async fn sign_out_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<SignOut>,
) -> Result<StatusCode, ApiError> {
    state.identity.sign_out(&body.access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        sub: user.sub,
        email: user.email,
        email_verified: user.email_verified,
        roles: user.groups,
    })
}

pub async fn admin_handler(user: AuthUser) -> Result<Json<MessageResponse>, ApiError> {
    user.require_roles(&[ADMIN_GROUP])?;
    Ok(MessageResponse::new("Welcome, admin user"))
}
