//! Blacklist administration handlers.
//!
//! Mounted under `/admin`, behind bearer auth and the admin check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::BlacklistEntry;
use crate::errors::{AppResult, ErrorBody};

/// Single domain label to block
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DomainRequest {
    #[schema(example = "spammy")]
    pub domain: String,
}

/// Batch of labels; non-string items are reported per item.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchDomainRequest {
    #[schema(value_type = Vec<Object>, example = json!(["spammy", "junk"]))]
    pub domains: Vec<Value>,
}

/// Outcome for one batch item
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchItemResult {
    /// The submitted value, echoed back
    #[schema(value_type = Object)]
    pub domain: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BlacklistEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl BatchItemResult {
    fn invalid_type(domain: Value) -> Self {
        Self {
            domain,
            result: None,
            error: Some(ErrorBody {
                code: "INVALID_DOMAIN_TYPE".to_string(),
                message: "Domain must be a string".to_string(),
            }),
        }
    }
}

/// Create admin blacklist routes
pub fn blacklist_routes() -> Router<AppState> {
    Router::new()
        .route("/blacklist", get(list_domains).post(create_domain))
        .route("/blacklist/batch", post(create_domains))
        .route(
            "/blacklist/:id",
            get(get_domain).put(update_domain).delete(delete_domain),
        )
}

/// List blocked domain labels
#[utoipa::path(
    get,
    path = "/admin/blacklist",
    tag = "Blacklist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All entries", body = Vec<BlacklistEntry>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_domains(State(state): State<AppState>) -> AppResult<Json<Vec<BlacklistEntry>>> {
    Ok(Json(state.blacklist_service.list_domains().await?))
}

/// Block one domain label
#[utoipa::path(
    post,
    path = "/admin/blacklist",
    tag = "Blacklist",
    security(("bearer_auth" = [])),
    request_body = DomainRequest,
    responses(
        (status = 201, description = "Entry created", body = BlacklistEntry),
        (status = 400, description = "Not a single domain label"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_domain(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DomainRequest>,
) -> AppResult<(StatusCode, Json<BlacklistEntry>)> {
    let entry = state.blacklist_service.add_domain(payload.domain).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Block many labels; each item succeeds or fails on its own
#[utoipa::path(
    post,
    path = "/admin/blacklist/batch",
    tag = "Blacklist",
    security(("bearer_auth" = [])),
    request_body = BatchDomainRequest,
    responses(
        (status = 200, description = "Per-item results, in request order", body = Vec<BatchItemResult>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_domains(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<BatchDomainRequest>,
) -> Json<Vec<BatchItemResult>> {
    // Strings go to the service; everything else is rejected in place.
    let strings: Vec<String> = payload
        .domains
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let mut outcomes = state
        .blacklist_service
        .add_domains(strings)
        .await
        .into_iter();

    let results = payload
        .domains
        .into_iter()
        .map(|value| {
            if !value.is_string() {
                return BatchItemResult::invalid_type(value);
            }
            match outcomes.next() {
                Some(Ok(entry)) => BatchItemResult {
                    domain: value,
                    result: Some(entry),
                    error: None,
                },
                Some(Err(e)) => BatchItemResult {
                    domain: value,
                    result: None,
                    error: Some(e.body()),
                },
                None => BatchItemResult {
                    domain: value,
                    result: None,
                    error: Some(ErrorBody {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal error occurred".to_string(),
                    }),
                },
            }
        })
        .collect();

    Json(results)
}

/// Get one entry
#[utoipa::path(
    get,
    path = "/admin/blacklist/{id}",
    tag = "Blacklist",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry", body = BlacklistEntry),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn get_domain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BlacklistEntry>> {
    Ok(Json(state.blacklist_service.get_domain(id).await?))
}

/// Replace an entry's label
#[utoipa::path(
    put,
    path = "/admin/blacklist/{id}",
    tag = "Blacklist",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = DomainRequest,
    responses(
        (status = 200, description = "Entry updated", body = BlacklistEntry),
        (status = 400, description = "Not a single domain label"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn update_domain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<DomainRequest>,
) -> AppResult<Json<BlacklistEntry>> {
    let entry = state
        .blacklist_service
        .update_domain(id, payload.domain)
        .await?;
    Ok(Json(entry))
}

/// Remove an entry
#[utoipa::path(
    delete,
    path = "/admin/blacklist/{id}",
    tag = "Blacklist",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_domain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.blacklist_service.delete_domain(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
