//! HTTP transport for the ledger
//!
//! Exposes transaction submission, mining and chain reads, plus a small set
//! of node-management endpoints under `/api`.

use axum::{
    extract::{Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::ChainSnapshot;
use crate::error::ChainError;
use crate::node::LedgerNode;
use crate::transaction::{Transaction, TransactionRequest};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub node: Arc<LedgerNode>,
    stats: Arc<RwLock<ApiStats>>,
}

impl ApiState {
    pub fn new(node: Arc<LedgerNode>) -> Self {
        Self {
            node,
            stats: Arc::new(RwLock::new(ApiStats::default())),
        }
    }
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    transactions_submitted: u64,
    malformed_submissions: u64,
}

impl ApiStats {
    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    MissingValues,
    Ledger(ChainError),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingValues => (StatusCode::BAD_REQUEST, "Missing values".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Ledger(e) => {
                let status = match &e {
                    ChainError::MalformedTransaction(_) | ChainError::InvalidAmount(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ChainError::ProofNotFound { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    ChainError::MiningCancelled
                    | ChainError::MiningAlreadyRunning
                    | ChainError::MiningNotRunning => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::MalformedTransaction(_) => ApiError::MissingValues,
            other => ApiError::Ledger(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct NewTransactionResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Debug, Serialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub transactions_submitted: u64,
    pub malformed_submissions: u64,
    pub uptime_seconds: u64,
    pub blocks_mined: u64,
    pub is_mining: bool,
}

#[derive(Serialize)]
struct SuccessResponse {
    message: String,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    state.stats.write().await.record_request(success);

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Builds the full router. Used by the server and by tests.
pub fn build_api_router(node: Arc<LedgerNode>) -> Router {
    let state = ApiState::new(node);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/node", get(get_node_info))
        .route("/mempool", get(get_mempool))
        .route("/chain/block/:index", get(get_block_by_index))
        .route("/chain/verify", get(verify_chain))
        .route("/mining/start", post(start_mining))
        .route("/mining/stop", post(stop_mining))
        .route("/mining/status", get(get_mining_status))
        .route("/stats", get(get_api_stats));

    Router::new()
        .route("/transactions/new", post(new_transaction))
        .route("/mine", get(mine).post(mine))
        .route("/chain", get(full_chain))
        .nest("/api", api_routes)
        // logging wraps stats so timing covers the whole request
        .layer(middleware::from_fn_with_state(state.clone(), stats_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors)
        .with_state(state)
}

/// Serves the API on `addr` until the process exits.
pub async fn run_api_server(
    node: Arc<LedgerNode>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn new_transaction(
    State(state): State<ApiState>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<NewTransactionResponse>), ApiError> {
    let tx = match request.into_transaction() {
        Ok(tx) => tx,
        Err(e) => {
            state.stats.write().await.malformed_submissions += 1;
            tracing::debug!("rejected submission: {}", e);
            return Err(e.into());
        }
    };

    let index = state.node.submit_transaction(tx).await;
    state.stats.write().await.transactions_submitted += 1;

    Ok((
        StatusCode::CREATED,
        Json(NewTransactionResponse {
            message: format!("Transaction will be added to Block {}", index),
            index,
        }),
    ))
}

async fn mine(State(state): State<ApiState>) -> Result<Json<MineResponse>, ApiError> {
    let block = state.node.mine_block().await?;

    Ok(Json(MineResponse {
        message: "New Block Forged".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn full_chain(State(state): State<ApiState>) -> Json<ChainSnapshot> {
    Json(state.node.read_chain().await)
}

async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "chain_length": state.node.chain_length().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_node_info(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "node_identifier": state.node.node_identifier(),
        "uptime_seconds": state.node.uptime().as_secs(),
    }))
}

async fn get_mempool(State(state): State<ApiState>) -> impl IntoResponse {
    let transactions = state.node.pending_transactions().await;
    Json(serde_json::json!({
        "count": transactions.len(),
        "transactions": transactions,
    }))
}

async fn get_block_by_index(
    State(state): State<ApiState>,
    Path(index): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .node
        .get_block(index)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block {} not found", index)))
}

async fn verify_chain(State(state): State<ApiState>) -> impl IntoResponse {
    match state.node.verify().await {
        Ok(()) => Json(serde_json::json!({ "valid": true })),
        Err(e) => Json(serde_json::json!({ "valid": false, "error": e.to_string() })),
    }
}

async fn start_mining(State(state): State<ApiState>) -> Result<Json<SuccessResponse>, ApiError> {
    state.node.start_mining().await?;
    Ok(Json(SuccessResponse {
        message: "Mining started".to_string(),
    }))
}

async fn stop_mining(State(state): State<ApiState>) -> Result<Json<SuccessResponse>, ApiError> {
    state.node.stop_mining().await?;
    Ok(Json(SuccessResponse {
        message: "Mining stopped".to_string(),
    }))
}

async fn get_mining_status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "is_mining": state.node.is_mining(),
        "blocks_mined": state.node.blocks_mined(),
    }))
}

async fn get_api_stats(State(state): State<ApiState>) -> impl IntoResponse {
    let stats = state.stats.read().await;
    Json(ApiStatsResponse {
        total_requests: stats.total_requests,
        successful_requests: stats.successful_requests,
        failed_requests: stats.failed_requests,
        transactions_submitted: stats.transactions_submitted,
        malformed_submissions: stats.malformed_submissions,
        uptime_seconds: state.node.uptime().as_secs(),
        blocks_mined: state.node.blocks_mined(),
        is_mining: state.node.is_mining(),
    })
}
