pub mod cache;
pub mod forms;

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Utc;
use stockdesk_core::{SheetStore, StoreError};
use stockdesk_inventory::{DEFAULT_TOP_N, alerts, compute_state, daily_flow, search, top_by_stock};
use stockdesk_platform::{
    AppendMovementResponse, DashboardView, MovementsResponse, StockInForm, StockOutForm,
    StockTableQuery, StockTableResponse, TrendResponse,
};
use stockdesk_session::{SessionId, SessionRegistry};
use stockdesk_sheets::{LedgerClient, NewMovement};
use tracing::{error, info};

use crate::cache::LedgerCache;

pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

#[derive(Clone)]
pub struct AppState {
    client: LedgerClient,
    cache: Arc<LedgerCache>,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn SheetStore>, cache_ttl: Duration) -> Self {
        let client = LedgerClient::new(store);
        Self {
            cache: Arc::new(LedgerCache::new(client.clone(), cache_ttl)),
            client,
            sessions: Arc::new(SessionRegistry::default()),
        }
    }

    /// Drop session trends after `idle` without a request.
    pub fn with_session_idle(mut self, idle: Duration) -> Self {
        self.sessions = Arc::new(SessionRegistry::new(idle));
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dashboard", get(dashboard))
        .route("/stock", get(stock_table))
        .route("/movements", get(movements))
        .route("/trend", get(trend).delete(reset_trend))
        .route("/session", delete(end_session))
        .route("/refresh", post(refresh))
        .route("/stock-in", post(append_stock_in))
        .route("/stock-out", post(append_stock_out))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// One page render: fetch (or reuse) the ledgers, derive state and record the
/// alert counts in the caller's session trend.
async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session = session_from(&headers);
    let loaded = state.cache.load().await;
    let ledger = compute_state(&loaded.input);

    let now = Utc::now();
    state
        .sessions
        .record_snapshot(&session, ledger.totals.alerts, now)
        .await;

    info!(
        %session,
        items = ledger.totals.item_count,
        alerts = ledger.totals.alerts.total(),
        diagnostics = ledger.diagnostics.len(),
        stale = loaded.stale,
        "dashboard rendered"
    );

    let view = DashboardView {
        generated_at: now,
        stale: loaded.stale,
        fetched_at: loaded.fetched_at,
        alerts: alerts(&ledger.items),
        top_stock: top_by_stock(&ledger.items, DEFAULT_TOP_N),
        daily_flow: daily_flow(loaded.input.movements()),
        totals: ledger.totals,
        diagnostics: ledger.diagnostics,
    };

    ([(SESSION_HEADER, session.to_string())], Json(view))
}

async fn stock_table(
    State(state): State<AppState>,
    Query(query): Query<StockTableQuery>,
) -> Json<StockTableResponse> {
    let loaded = state.cache.load().await;
    let ledger = compute_state(&loaded.input);
    let items = search(&ledger.items, query.search.as_deref().unwrap_or_default());

    Json(StockTableResponse {
        stale: loaded.stale,
        items,
    })
}

async fn movements(State(state): State<AppState>) -> Json<MovementsResponse> {
    let loaded = state.cache.load().await;

    Json(MovementsResponse {
        stale: loaded.stale,
        stock_in: loaded.input.stock_in.rows.clone(),
        stock_out: loaded.input.stock_out.rows.clone(),
    })
}

async fn trend(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let session = session_from(&headers);
    let snapshots = state.sessions.trend(&session).await;

    (
        [(SESSION_HEADER, session.to_string())],
        Json(TrendResponse {
            session_id: session.to_string(),
            snapshots,
        }),
    )
}

async fn reset_trend(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let session = session_from(&headers);
    state.sessions.reset(&session).await;
    StatusCode::NO_CONTENT
}

async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let session = session_from(&headers);
    state.sessions.end(&session).await;
    StatusCode::NO_CONTENT
}

async fn refresh(State(state): State<AppState>) -> StatusCode {
    state.cache.invalidate().await;
    info!("ledger cache cleared");
    StatusCode::NO_CONTENT
}

async fn append_stock_in(
    State(state): State<AppState>,
    Json(payload): Json<StockInForm>,
) -> Result<(StatusCode, Json<AppendMovementResponse>), (StatusCode, String)> {
    let movement =
        forms::validate_stock_in(&payload, Utc::now().date_naive()).map_err(invalid_request)?;
    append_movement(&state, movement).await
}

async fn append_stock_out(
    State(state): State<AppState>,
    Json(payload): Json<StockOutForm>,
) -> Result<(StatusCode, Json<AppendMovementResponse>), (StatusCode, String)> {
    let movement =
        forms::validate_stock_out(&payload, Utc::now().date_naive()).map_err(invalid_request)?;
    append_movement(&state, movement).await
}

async fn append_movement(
    state: &AppState,
    movement: NewMovement,
) -> Result<(StatusCode, Json<AppendMovementResponse>), (StatusCode, String)> {
    state
        .client
        .append_stock_movement(&movement)
        .await
        .map_err(store_error)?;
    state.cache.invalidate().await;

    let item_id = if movement.item_id.is_empty() {
        movement.product_name
    } else {
        movement.item_id
    };

    Ok((
        StatusCode::CREATED,
        Json(AppendMovementResponse {
            direction: movement.direction,
            item_id,
            quantity: movement.quantity,
            date: movement.date,
            appended_at: Utc::now(),
        }),
    ))
}

fn session_from(headers: &HeaderMap) -> SessionId {
    headers
        .get(&SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(SessionId::parse)
        .unwrap_or_else(SessionId::generate)
}

fn invalid_request(err: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn store_error(err: StoreError) -> (StatusCode, String) {
    error!("failed to append stock movement: {err}");
    match err {
        StoreError::Unavailable(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        StoreError::MissingHeaders(_) | StoreError::Rejected { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
