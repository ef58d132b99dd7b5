//! Shared harness for integration tests.
//!
//! Real services over in-memory repositories; no database or Redis needed.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use forum_auth::api::{create_router, AppState};
use forum_auth::config::Config;
use forum_auth::domain::{BlacklistEntry, NewUser, User, UserRole};
use forum_auth::errors::{AppError, AppResult};
use forum_auth::infra::{
    BlacklistRepository, HealthCheck, InMemoryOtpStore, InMemoryRateLimiter, UnitOfWork,
    UserRepository,
};
use forum_auth::jobs::{NotificationJob, NotificationQueue};
use forum_auth::services::{
    Authenticator, BlacklistManager, BlacklistService, OtpManager, OtpService, Services,
    UserManager, UserService,
};

pub const JWT_SECRET: &str = "integration-test-secret-that-is-32-chars";
pub const CLIENT_IP: &str = "198.51.100.1";

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.rows.lock().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.rows.lock().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(AppError::conflict("User"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            phone_code: user.phone_code,
            phone_number: user.phone_number,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        let mut rows = self.rows.lock().await;
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::UserNotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryBlacklist {
    rows: Mutex<Vec<BlacklistEntry>>,
}

#[async_trait]
impl BlacklistRepository for MemoryBlacklist {
    async fn create(&self, domain: String) -> AppResult<BlacklistEntry> {
        let entry = BlacklistEntry {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            domain,
        };
        self.rows.lock().await.push(entry.clone());
        Ok(entry)
    }

    async fn list(&self) -> AppResult<Vec<BlacklistEntry>> {
        Ok(self.rows.lock().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BlacklistEntry>> {
        Ok(self.rows.lock().await.iter().find(|e| e.id == id).cloned())
    }

    async fn update(&self, id: Uuid, domain: String) -> AppResult<BlacklistEntry> {
        let mut rows = self.rows.lock().await;
        let entry = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound)?;
        entry.domain = domain;
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|e| e.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn domains(&self) -> AppResult<Vec<String>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .map(|e| e.domain.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryUnitOfWork {
    users: Arc<MemoryUsers>,
    blacklist: Arc<MemoryBlacklist>,
}

impl UnitOfWork for MemoryUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn blacklist(&self) -> Arc<dyn BlacklistRepository> {
        self.blacklist.clone()
    }
}

/// Health probe with a fixed answer.
pub struct Probe(pub bool);

#[async_trait]
impl HealthCheck for Probe {
    async fn ping(&self) -> AppResult<()> {
        if self.0 {
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable("probe".to_string()))
        }
    }
}

/// Fully wired services plus the receiving end of the notification queue.
pub struct TestApp {
    pub router: Router,
    pub jobs: mpsc::Receiver<NotificationJob>,
    pub blacklist: Arc<dyn BlacklistService>,
    pub otp: Arc<dyn OtpService>,
    pub users: Arc<dyn UserService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_health(true, true)
    }

    pub fn with_health(database: bool, cache: bool) -> Self {
        Self::build(database, cache, true)
    }

    /// Forwarding headers are ignored; every oneshot request shares one address.
    pub fn without_proxy() -> Self {
        Self::build(true, true, false)
    }

    fn build(database: bool, cache: bool, trust_proxy: bool) -> Self {
        let uow = Arc::new(MemoryUnitOfWork::default());
        let (queue, jobs) = NotificationQueue::new(64);
        let config = Config::new(JWT_SECRET);

        let blacklist: Arc<dyn BlacklistService> = Arc::new(BlacklistManager::new(uow.clone()));
        let otp: Arc<dyn OtpService> = Arc::new(OtpManager::new(
            uow.clone(),
            Arc::new(InMemoryOtpStore::new()),
            blacklist.clone(),
            queue.clone(),
            config.otp_ttl(),
        ));
        let users: Arc<dyn UserService> = Arc::new(UserManager::new(uow.clone()));
        let auth = Arc::new(Authenticator::new(
            uow,
            blacklist.clone(),
            otp.clone(),
            queue,
            config,
        ));

        let services = Services::new(auth, users.clone(), blacklist.clone(), otp.clone());
        let state = AppState::from_container(
            &services,
            Arc::new(InMemoryRateLimiter::new()),
            Arc::new(Probe(database)),
            Arc::new(Probe(cache)),
        )
        .with_trusted_proxy(trust_proxy);

        Self {
            router: create_router(state),
            jobs,
            blacklist,
            otp,
            users,
        }
    }

    /// Send a request from `ip` and decode the JSON body (Null when empty).
    pub async fn send_from(
        &self,
        ip: &str,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Forwarded-For", ip);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        (status, json)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        self.send_from(CLIENT_IP, method, uri, body, token).await
    }

    /// Register through the API from a dedicated address; returns the token.
    pub async fn register(&self, username: &str, email: &str, ip: &str) -> String {
        let (status, body) = self
            .send_from(
                ip,
                Method::POST,
                "/auth/register",
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": "SecurePass123!",
                    "name": "Test User"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["token"]["access_token"].as_str().unwrap().to_string()
    }

    /// Token for a freshly promoted admin.
    pub async fn admin_token(&self) -> String {
        self.register("site_admin", "admin@example.com", "203.0.113.250")
            .await;
        self.users.promote_to_admin("admin@example.com").await.unwrap();

        let (status, body) = self
            .send_from(
                "203.0.113.250",
                Method::POST,
                "/auth/login",
                Some(serde_json::json!({
                    "username": "site_admin",
                    "password": "SecurePass123!"
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Most recently queued OTP code.
    pub fn last_otp(&mut self) -> String {
        let mut code = None;
        while let Ok(job) = self.jobs.try_recv() {
            if let NotificationJob::SendOtp { code: c, .. } = job {
                code = Some(c.as_str().to_string());
            }
        }
        code.expect("no OTP was queued")
    }
}
