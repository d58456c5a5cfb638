//! Local HTTP server for presentation layers.
//!
//! Exposes one patient's session:
//! - `GET /health`
//! - `GET /progress?mode=week&date=2024-04-10` returns a progress snapshot
//! - `POST /activities`, `/hydration`, `/meals`, `/weights` log a record
//! - `PATCH /:collection/:id` edits fields of a record
//! - `DELETE /:collection/:id` removes a record
//!
//! # Architecture
//!
//! ```text
//! Dashboard ──→ POST /meals ──→ TrackerSession ──→ persistence provider
//!     ↑                              │
//!     └──── GET /progress ←── ProgressBuilder
//! ```

use crate::config::Goals;
use crate::core::bucketing::RangeMode;
use crate::core::progress::{ProgressBuilder, ProgressSnapshot};
use crate::records::patch::{ActivityPatch, HydrationPatch, MealPatch, Patch, WeightPatch};
use crate::records::store::StoreError;
use crate::records::types::{
    Activity, HydrationLog, Meal, Record, RecordId, RecordMeta, ValidationError, WeightEntry,
    WeightUnit,
};
use crate::session::{SessionError, Tracked, TrackerSession};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Goals progress is measured against
    pub goals: Goals,
    /// Unit weights are reported in
    pub weight_unit: WeightUnit,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, goals: Goals, weight_unit: WeightUnit) -> Self {
        Self {
            port,
            goals,
            weight_unit,
        }
    }
}

/// Shared server state
pub struct ServerState {
    /// Single-writer session
    session: RwLock<TrackerSession>,
    builder: ProgressBuilder,
    /// Unit for weights posted without one
    weight_unit: WeightUnit,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig, session: TrackerSession) -> Self {
        Self {
            session: RwLock::new(session),
            builder: ProgressBuilder::new(config.goals).with_weight_unit(config.weight_unit),
            weight_unit: config.weight_unit,
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub user_id: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Record the failed operation concerned, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl ToString, id: Option<RecordId>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
            id,
        }),
    )
}

impl From<ValidationError> for ErrorResponse {
    fn from(e: ValidationError) -> Self {
        ErrorResponse {
            error: e.to_string(),
            code: "INVALID_INPUT".to_string(),
            id: None,
        }
    }
}

fn invalid(e: ValidationError) -> ApiError {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(e.into()))
}

fn session_error(e: SessionError) -> ApiError {
    match e {
        SessionError::Store(StoreError::InvalidInput(e)) => invalid(e),
        SessionError::Store(StoreError::NotFound(id)) => {
            api_error(StatusCode::NOT_FOUND, "NOT_FOUND", StoreError::NotFound(id), Some(id))
        }
        SessionError::Store(StoreError::DuplicateId(id)) => api_error(
            StatusCode::CONFLICT,
            "DUPLICATE_ID",
            StoreError::DuplicateId(id),
            Some(id),
        ),
        SessionError::ForeignRecord { id, .. } => {
            api_error(StatusCode::FORBIDDEN, "FOREIGN_RECORD", &e, Some(id))
        }
        SessionError::Sync { id, .. } => {
            tracing::error!("record {id} not saved: {e}");
            api_error(StatusCode::BAD_GATEWAY, "SYNC_FAILED", &e, Some(id))
        }
    }
}

/// Response to a successful mutation
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordResponse {
    pub status: String,
    pub id: RecordId,
}

impl RecordResponse {
    fn ok(id: RecordId) -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
            id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub mode: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityInput {
    pub steps: u32,
    pub active_minutes: u32,
    #[serde(default)]
    pub calories_burned: u32,
    pub activity_type: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct HydrationInput {
    pub ounces: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MealInput {
    pub name: String,
    pub protein_grams: f64,
    pub image_ref: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct WeightInput {
    pub value: f64,
    pub unit: Option<WeightUnit>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let session = state.session.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        user_id: session.user_id().to_string(),
    })
}

/// GET /progress
async fn progress(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    let mode = match query.mode.as_deref() {
        Some(mode) => mode
            .parse::<RangeMode>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_MODE", e, None))?,
        None => RangeMode::Week,
    };

    let session = state.session.read().await;
    let date = query.date.unwrap_or_else(|| session.today());
    Ok(Json(state.builder.build(&session, mode, date)))
}

async fn append_record<R: Tracked>(
    state: &ServerState,
    build: impl FnOnce(RecordMeta) -> Result<R, ValidationError>,
    timestamp: Option<DateTime<Utc>>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let mut session = state.session.write().await;
    let meta = RecordMeta::new(session.user_id(), timestamp.unwrap_or_else(Utc::now))
        .map_err(invalid)?;
    let record = build(meta).map_err(invalid)?;
    let id = session.append(record).await.map_err(session_error)?;
    tracing::info!(collection = R::COLLECTION, %id, "record logged");
    Ok((StatusCode::CREATED, RecordResponse::ok(id)))
}

/// POST /activities
async fn post_activity(
    State(state): State<Arc<ServerState>>,
    Json(input): Json<ActivityInput>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let timestamp = input.timestamp;
    append_record(
        &state,
        |meta| {
            Activity::new(
                meta,
                input.steps,
                input.active_minutes,
                input.calories_burned,
                input.activity_type,
            )
        },
        timestamp,
    )
    .await
}

/// POST /hydration
async fn post_hydration(
    State(state): State<Arc<ServerState>>,
    Json(input): Json<HydrationInput>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    append_record(&state, |meta| HydrationLog::new(meta, input.ounces), input.timestamp).await
}

/// POST /meals
async fn post_meal(
    State(state): State<Arc<ServerState>>,
    Json(input): Json<MealInput>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let timestamp = input.timestamp;
    append_record(
        &state,
        |meta| Meal::new(meta, input.name, input.protein_grams, input.image_ref),
        timestamp,
    )
    .await
}

/// POST /weights
async fn post_weight(
    State(state): State<Arc<ServerState>>,
    Json(input): Json<WeightInput>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let unit = input.unit.unwrap_or(state.weight_unit);
    append_record(
        &state,
        |meta| WeightEntry::new(meta, input.value, unit),
        input.timestamp,
    )
    .await
}

async fn apply_patch<R, P>(
    state: &ServerState,
    id: RecordId,
    body: serde_json::Value,
) -> Result<(), ApiError>
where
    R: Tracked,
    P: Patch<R> + DeserializeOwned,
{
    let patch: P = serde_json::from_value(body).map_err(|e| {
        api_error(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT", e, Some(id))
    })?;
    if patch.is_empty() {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_INPUT",
            "No fields to update",
            Some(id),
        ));
    }

    let mut session = state.session.write().await;
    session
        .update::<R, _>(id, |record| patch.apply(record))
        .await
        .map_err(session_error)
}

/// PATCH /:collection/:id
async fn update_record(
    State(state): State<Arc<ServerState>>,
    Path((collection, id)): Path<(String, RecordId)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<RecordResponse>, ApiError> {
    match collection.as_str() {
        c if c == Activity::COLLECTION => {
            apply_patch::<Activity, ActivityPatch>(&state, id, body).await
        }
        c if c == HydrationLog::COLLECTION => {
            apply_patch::<HydrationLog, HydrationPatch>(&state, id, body).await
        }
        c if c == Meal::COLLECTION => apply_patch::<Meal, MealPatch>(&state, id, body).await,
        c if c == WeightEntry::COLLECTION => {
            apply_patch::<WeightEntry, WeightPatch>(&state, id, body).await
        }
        other => Err(api_error(
            StatusCode::NOT_FOUND,
            "UNKNOWN_COLLECTION",
            format!("Unknown collection '{other}'"),
            None,
        )),
    }?;
    tracing::info!(%collection, %id, "record updated");
    Ok(RecordResponse::ok(id))
}

/// DELETE /:collection/:id
async fn delete_record(
    State(state): State<Arc<ServerState>>,
    Path((collection, id)): Path<(String, RecordId)>,
) -> Result<Json<RecordResponse>, ApiError> {
    let mut session = state.session.write().await;
    let result = match collection.as_str() {
        c if c == Activity::COLLECTION => session.delete::<Activity>(id).await.map(|_| ()),
        c if c == HydrationLog::COLLECTION => session.delete::<HydrationLog>(id).await.map(|_| ()),
        c if c == Meal::COLLECTION => session.delete::<Meal>(id).await.map(|_| ()),
        c if c == WeightEntry::COLLECTION => session.delete::<WeightEntry>(id).await.map(|_| ()),
        other => {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "UNKNOWN_COLLECTION",
                format!("Unknown collection '{other}'"),
                None,
            ))
        }
    };
    result.map_err(session_error)?;
    tracing::info!(%collection, %id, "record deleted");
    Ok(RecordResponse::ok(id))
}

/// Build the router over `state`.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/progress", get(progress))
        .route("/activities", post(post_activity))
        .route("/hydration", post(post_hydration))
        .route("/meals", post(post_meal))
        .route("/weights", post(post_weight))
        .route(
            "/:collection/:id",
            patch(update_record).delete(delete_record),
        )
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    session: TrackerSession,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config, session));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Progress server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
