//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, blacklist_handler, user_handler};
use crate::domain::{BlacklistEntry, UserResponse, UserRole};
use crate::errors::ErrorBody;
use crate::services::TokenResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Forum Auth",
        version = "0.1.0",
        description = "Signup, login and one-time passcode authentication with email domain blacklisting"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::signup,
        auth_handler::login,
        auth_handler::request_otp,
        auth_handler::verify_otp,
        user_handler::get_current_user,
        blacklist_handler::list_domains,
        blacklist_handler::create_domain,
        blacklist_handler::create_domains,
        blacklist_handler::get_domain,
        blacklist_handler::update_domain,
        blacklist_handler::delete_domain,
    ),
    components(
        schemas(
            UserRole,
            UserResponse,
            BlacklistEntry,
            ErrorBody,
            TokenResponse,
            auth_handler::RegisterRequest,
            auth_handler::SignupRequest,
            auth_handler::LoginRequest,
            auth_handler::OtpRequest,
            auth_handler::OtpRequestResponse,
            auth_handler::OtpVerifyRequest,
            auth_handler::OtpVerifyResponse,
            auth_handler::AuthResponse,
            blacklist_handler::DomainRequest,
            blacklist_handler::BatchDomainRequest,
            blacklist_handler::BatchItemResult,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Signup, login and OTP"),
        (name = "Users", description = "Current user"),
        (name = "Blacklist", description = "Blocked email domain labels (admin)")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token from /auth/login or /auth/otp/verify"))
                        .build(),
                ),
            );
        }
    }
}
