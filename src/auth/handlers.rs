use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, PublicUser,
        RegisterRequest, RegisterResponse, ResetPasswordRequest, VerifyOtpRequest,
    },
    extractors::AuthUser,
    services,
};
use crate::{error::AppError, extract::AppJson, state::AppState};

pub const FORGOT_PASSWORD_MESSAGE: &str = "If that email exists, a reset code has been sent.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(get_me))
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful. Please check your email for OTP.",
            email: user.email,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::verify_otp(&state, &payload.email, &payload.otp).await?;
    Ok(Json(MessageResponse::ok(
        "Email verified successfully. You can now login.",
    )))
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    payload: LoginRequest,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = services::login(&state, &payload.username, &payload.password).await?;
    Ok(Json(LoginResponse {
        success: true,
        token,
        user: PublicUser::from(&user),
        message: "Login successful",
    }))
}

/// Tokens are stateless; the client just drops its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Logged out successfully"))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::forgot_password(&state, &payload.email).await?;
    Ok(Json(MessageResponse::ok(FORGOT_PASSWORD_MESSAGE)))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::reset_password(
        &state,
        &payload.email,
        &payload.otp,
        payload.new_password,
    )
    .await?;
    Ok(Json(MessageResponse::ok(
        "Password reset successful. You can now log in.",
    )))
}

#[instrument(skip(state, claims), fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(PublicUser::from(&user)))
}
