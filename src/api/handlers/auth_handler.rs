//! Authentication handlers.
//!
//! Each route enforces its own named limits before touching any service.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{ClientIp, ValidatedJson};
use crate::api::AppState;
use crate::config::*;
use crate::domain::{CreateUser, UserResponse};
use crate::errors::AppResult;
use crate::infra::RateLimit;
use crate::services::TokenResponse;

const SIGNUP: RateLimit = RateLimit::new(
    "signup",
    RATE_LIMIT_SIGNUP_REQUESTS,
    RATE_LIMIT_SIGNUP_WINDOW_SECONDS,
);
const SIGNUP_LONG: RateLimit = RateLimit::new(
    "signup_long",
    RATE_LIMIT_SIGNUP_LONG_REQUESTS,
    RATE_LIMIT_SIGNUP_LONG_WINDOW_SECONDS,
);
const LOGIN: RateLimit = RateLimit::new(
    "login",
    RATE_LIMIT_LOGIN_REQUESTS,
    RATE_LIMIT_LOGIN_WINDOW_SECONDS,
);
const LOGIN_USER: RateLimit = RateLimit::new(
    "login_user",
    RATE_LIMIT_LOGIN_USER_REQUESTS,
    RATE_LIMIT_LOGIN_USER_WINDOW_SECONDS,
);
const OTP: RateLimit = RateLimit::new("otp", RATE_LIMIT_OTP_REQUESTS, RATE_LIMIT_OTP_WINDOW_SECONDS);
const OTP_EMAIL: RateLimit = RateLimit::new(
    "otp_email",
    RATE_LIMIT_OTP_EMAIL_REQUESTS,
    RATE_LIMIT_OTP_EMAIL_WINDOW_SECONDS,
);
const OTP_VERIFY: RateLimit = RateLimit::new(
    "otp_verify",
    RATE_LIMIT_OTP_VERIFY_REQUESTS,
    RATE_LIMIT_OTP_VERIFY_WINDOW_SECONDS,
);
const OTP_VERIFY_EMAIL: RateLimit = RateLimit::new(
    "otp_verify_email",
    RATE_LIMIT_OTP_VERIFY_EMAIL_REQUESTS,
    RATE_LIMIT_OTP_VERIFY_EMAIL_WINDOW_SECONDS,
);

/// Password signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "jane_doe")]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "+1")]
    pub phone_code: Option<String>,
    #[schema(example = "5550100")]
    pub phone_number: Option<String>,
    /// Required when captcha verification is enabled
    pub captcha_token: Option<String>,
}

/// Passwordless signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[schema(example = "jane_doe")]
    pub username: String,
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
}

/// Password login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "jane_doe")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// OTP issuance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OtpRequest {
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// OTP issuance response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestResponse {
    /// Pass back to `/auth/otp/verify`
    pub session_id: Uuid,
}

/// OTP verification request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "4821")]
    pub otp: String,
    #[serde(default)]
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub session_id: String,
}

/// OTP verification response
#[derive(Debug, Serialize, ToSchema)]
pub struct OtpVerifyResponse {
    #[schema(example = "OTP verified successfully")]
    pub message: String,
    pub token: TokenResponse,
}

/// Signup response: the new account, already logged in.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: TokenResponse,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/otp/request", post(request_otp))
        .route("/otp/verify", post(verify_otp))
}

async fn enforce_signup_limits(state: &AppState, client: &str) -> AppResult<()> {
    SIGNUP.enforce(state.rate_limiter.as_ref(), client).await?;
    SIGNUP_LONG.enforce(state.rate_limiter.as_ref(), client).await
}

/// Register with a password
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered and logged in", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Blocked email domain or failed captcha"),
        (status = 409, description = "Username or email already taken"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    enforce_signup_limits(&state, &client).await?;

    let input = CreateUser {
        username: payload.username,
        email: payload.email,
        password: Some(payload.password),
        name: payload.name,
        phone_code: payload.phone_code,
        phone_number: payload.phone_number,
    };
    let (user, token) = state
        .auth_service
        .register(input, payload.captcha_token)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(user),
            token,
        }),
    ))
}

/// Register without a password
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered and logged in", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Blocked email domain"),
        (status = 409, description = "Username or email already taken"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    enforce_signup_limits(&state, &client).await?;

    let input = CreateUser {
        username: payload.username,
        email: payload.email,
        password: None,
        name: payload.name,
        phone_code: payload.phone_code,
        phone_number: payload.phone_number,
    };
    let (user, token) = state.auth_service.signup_passwordless(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(user),
            token,
        }),
    ))
}

/// Login with username or email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    LOGIN.enforce(state.rate_limiter.as_ref(), &client).await?;
    LOGIN_USER
        .enforce(
            state.rate_limiter.as_ref(),
            &format!("{}:{}", client, payload.username),
        )
        .await?;

    let token = state
        .auth_service
        .login(payload.username, payload.password)
        .await?;

    Ok(Json(token))
}

/// Send a one-time passcode to a registered email
#[utoipa::path(
    post,
    path = "/auth/otp/request",
    tag = "Authentication",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP issued", body = OtpRequestResponse),
        (status = 400, description = "Missing or malformed email"),
        (status = 403, description = "Blocked email domain"),
        (status = 404, description = "No user with this email"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn request_otp(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    ValidatedJson(payload): ValidatedJson<OtpRequest>,
) -> AppResult<Json<OtpRequestResponse>> {
    OTP.enforce(state.rate_limiter.as_ref(), &client).await?;
    OTP_EMAIL
        .enforce(state.rate_limiter.as_ref(), &payload.email)
        .await?;

    let session_id = state.otp_service.request_otp(&payload.email).await?;

    Ok(Json(OtpRequestResponse { session_id }))
}

/// Exchange a one-time passcode for a token
#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    tag = "Authentication",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "OTP verified", body = OtpVerifyResponse),
        (status = 400, description = "Invalid or expired OTP"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    ValidatedJson(payload): ValidatedJson<OtpVerifyRequest>,
) -> AppResult<Json<OtpVerifyResponse>> {
    OTP_VERIFY
        .enforce(
            state.rate_limiter.as_ref(),
            &format!("{}:{}", client, payload.email),
        )
        .await?;
    // Guesses against one inbox are capped however many addresses send them
    OTP_VERIFY_EMAIL
        .enforce(state.rate_limiter.as_ref(), &payload.email)
        .await?;

    let token = state
        .auth_service
        .login_with_otp(&payload.email, &payload.session_id, &payload.otp)
        .await?;

    Ok(Json(OtpVerifyResponse {
        message: "OTP verified successfully".to_string(),
        token,
    }))
}
