//! Service-level OTP and blacklist flows.

mod common;

use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use common::TestApp;
use forum_auth::errors::AppError;

const EMAIL: &str = "jane@mail.example.com";

async fn app_with_user() -> TestApp {
    let app = TestApp::new();
    app.register("jane_doe", EMAIL, "192.0.2.1").await;
    app
}

#[tokio::test(start_paused = true)]
async fn test_code_expires_after_ttl() {
    let mut app = app_with_user().await;

    let session = assert_ok!(app.otp.request_otp(EMAIL).await);
    let code = app.last_otp();

    tokio::time::advance(Duration::from_secs(301)).await;

    assert!(matches!(
        app.otp.verify_otp(EMAIL, &session.to_string(), &code).await,
        Err(AppError::OtpExpired)
    ));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let mut app = app_with_user().await;

    let first = assert_ok!(app.otp.request_otp(EMAIL).await);
    let first_code = app.last_otp();
    let second = assert_ok!(app.otp.request_otp(EMAIL).await);
    let second_code = app.last_otp();
    assert_ne!(first, second);

    // Consuming one session leaves the other usable
    assert_ok!(
        app.otp
            .verify_otp(EMAIL, &second.to_string(), &second_code)
            .await
    );
    assert_ok!(
        app.otp
            .verify_otp(EMAIL, &first.to_string(), &first_code)
            .await
    );
}

#[tokio::test]
async fn test_session_bound_to_email() {
    let mut app = app_with_user().await;
    app.register("other_user", "other@example.com", "192.0.2.2")
        .await;

    let session = assert_ok!(app.otp.request_otp(EMAIL).await);
    let code = app.last_otp();

    assert!(matches!(
        app.otp
            .verify_otp("other@example.com", &session.to_string(), &code)
            .await,
        Err(AppError::OtpExpired)
    ));
}

#[tokio::test]
async fn test_blocking_after_signup_stops_otp() {
    let app = app_with_user().await;
    assert_ok!(app.otp.request_otp(EMAIL).await);

    assert_ok!(app.blacklist.add_domain("mail".to_string()).await);

    assert!(matches!(
        app.otp.request_otp(EMAIL).await,
        Err(AppError::BlockedDomain)
    ));
}

#[tokio::test]
async fn test_last_label_never_matches() {
    let app = TestApp::new();
    assert_ok!(app.blacklist.add_domain("spammy".to_string()).await);

    assert!(assert_ok!(app.blacklist.is_domain_blocked("mail.spammy.co").await));
    assert!(assert_ok!(app.blacklist.is_domain_blocked("spammy.co").await));
    assert!(!assert_ok!(app.blacklist.is_domain_blocked("co.spammy").await));
    assert!(!assert_ok!(app.blacklist.is_domain_blocked("spammy").await));
    assert_err!(app.blacklist.check_email("no-at-sign").await);
}
