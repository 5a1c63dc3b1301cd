//! HTTP endpoint.
//!
//! One JSON endpoint (mounted at `/` and `/api`) serves the whole UI:
//!
//! - `GET` with no ids: customers plus the first clothing types.
//! - `GET ?customer_id=..&clothing_type_id=..`: the measurement form.
//! - `POST {"action": ...}`: `add_customer`, `save_measurements`,
//!   `delete_customer`.
//!
//! Every route is CORS-open and answers `{success, message?, ...}`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use tailorbook_core::model::SaveSummary;
use tailorbook_core::Database;

use crate::error::ApiError;
use crate::protocol::{
    AddCustomerRequest, CustomerCreated, DeleteCustomerRequest, EndpointQuery, Envelope,
    MeasurementsPayload, NoPayload, SaveMeasurementsRequest,
};

/// Shared handler state: the store handle plus the one setting the handlers
/// need.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub overview_clothing_types: usize,
}

impl AppState {
    pub fn new(db: Arc<Database>, overview_clothing_types: usize) -> Self {
        Self {
            db,
            overview_clothing_types,
        }
    }
}

/// Build the complete router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", endpoint())
        .route("/api", endpoint())
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn(log_requests))
}

fn endpoint() -> MethodRouter<AppState> {
    get(handle_get)
        .post(handle_post)
        .fallback(method_not_allowed)
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Open CORS on every response and answer preflight requests directly.
async fn cors(req: Request, next: Next) -> Response {
    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };

    let headers = resp.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    resp
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let resp = next.run(req).await;
    info!(%method, path, status = resp.status().as_u16(), "request");
    resp
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_get(
    State(state): State<AppState>,
    query: Result<Query<EndpointQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;

    match query.measurement_key()? {
        Some((customer_id, clothing_type_id)) => {
            let measurements = state.db.get_measurements(customer_id, clothing_type_id)?;
            Ok(Json(Envelope::ok(MeasurementsPayload { measurements })).into_response())
        }
        None => {
            let overview = state.db.list_overview(state.overview_clothing_types)?;
            Ok(Json(Envelope::ok(overview)).into_response())
        }
    }
}

/// Dispatch a POST body on its `action` field.
async fn handle_post(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::Validation("Request body must be a JSON object".into()))?;
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ApiError::MissingAction)?
        .to_string();

    match action.as_str() {
        "add_customer" => add_customer(&state, body),
        "save_measurements" => save_measurements(&state, body),
        "delete_customer" => delete_customer(&state, body),
        other => {
            warn!(action = other, "rejected unknown action");
            Err(ApiError::UnknownAction)
        }
    }
}

fn add_customer(state: &AppState, body: Value) -> Result<Response, ApiError> {
    let req: AddCustomerRequest = parse_body(body, "Customer name is required")?;
    let name = req
        .name
        .ok_or_else(|| ApiError::Validation("Customer name is required".into()))?;

    let customer_id = state.db.add_customer(&name).inspect_err(|e| {
        warn!(error = %e, "add_customer rejected");
    })?;
    info!(customer_id, name = name.trim(), "customer added");

    Ok(Json(
        Envelope::ok(CustomerCreated { customer_id }).with_message("Customer added successfully"),
    )
    .into_response())
}

fn save_measurements(state: &AppState, body: Value) -> Result<Response, ApiError> {
    let req: SaveMeasurementsRequest = parse_body(
        body,
        "Customer ID, clothing type ID, and measurements are required",
    )?;
    let batch = req.into_batch()?;

    let summary =
        state
            .db
            .save_measurements(batch.customer_id, batch.clothing_type_id, &batch.entries)?;
    let skipped = summary.skipped + batch.incomplete;
    info!(
        customer_id = batch.customer_id,
        clothing_type_id = batch.clothing_type_id,
        saved = summary.saved,
        skipped,
        "measurements saved"
    );

    let summary = SaveSummary {
        saved: summary.saved,
        skipped,
    };
    Ok(Json(Envelope::ok(summary).with_message("Measurements saved successfully")).into_response())
}

fn delete_customer(state: &AppState, body: Value) -> Result<Response, ApiError> {
    let req: DeleteCustomerRequest = parse_body(body, "Customer ID is required")?;
    let customer_id = req.customer_id()?;

    let removed = state.db.delete_customer(customer_id)?;
    info!(customer_id, measurements_removed = removed, "customer deleted");

    Ok(Json(Envelope::ok(NoPayload::default()).with_message("Customer deleted successfully"))
        .into_response())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound("No such endpoint".into())
}

/// Deserialize an action body, reporting any shape mismatch as `message`.
fn parse_body<T: DeserializeOwned>(body: Value, message: &str) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|_| ApiError::Validation(message.to_string()))
}
