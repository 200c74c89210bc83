use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::models::TransactionRecord;
use crate::store::MemoryStore;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server error: {0}")]
    Server(String),
}

/// Response for the current-block endpoint
#[derive(Debug, Serialize)]
pub struct CurrentBlockResponse {
    #[serde(rename = "currentBlock")]
    pub current_block: u64,
}

/// Response for a successful subscription
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub address: String,
    pub subscribed: bool,
}

/// Response for the transactions endpoint
#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub address: String,
    pub count: usize,
    pub transactions: Vec<TransactionRecord>,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Query parameters carrying the target address
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub address: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

/// Builds the HTTP router over the store.
pub fn router(store: Arc<MemoryStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/current-block", get(get_current_block))
        .route("/subscribe", get(subscribe))
        .route("/transactions", get(get_transactions))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// HTTP API server
pub struct ApiServer {
    store: Arc<MemoryStore>,
    host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(store: Arc<MemoryStore>, host: String, port: u16) -> Self {
        Self { store, host, port }
    }

    /// Serves the API until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), ApiError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(Arc::clone(&self.store));

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("failed to bind to {}: {}", addr, e)))?;

        log::info!("HTTP API listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::Server(format!("server error: {}", e)))?;

        Ok(())
    }
}

/// GET /current-block - the highest block number fully processed
pub async fn get_current_block(State(state): State<AppState>) -> Json<CurrentBlockResponse> {
    Json(CurrentBlockResponse {
        current_block: state.store.current_block(),
    })
}

/// GET /subscribe?address=0x.. - register an address for monitoring
pub async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<SubscribeResponse>, (StatusCode, Json<ErrorResponse>)> {
    if query.address.is_empty() {
        return Err(missing_address());
    }

    if state.store.subscribe(&query.address) {
        Ok(Json(SubscribeResponse {
            address: query.address,
            subscribed: true,
        }))
    } else {
        Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "already_subscribed".to_string(),
                message: format!("address {} is already subscribed", query.address),
            }),
        ))
    }
}

/// GET /transactions?address=0x.. - the stored records for an address
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<TransactionsResponse>, (StatusCode, Json<ErrorResponse>)> {
    if query.address.is_empty() {
        return Err(missing_address());
    }

    let transactions = state.store.transactions(&query.address);
    Ok(Json(TransactionsResponse {
        address: query.address,
        count: transactions.len(),
        transactions,
    }))
}

fn missing_address() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "missing_parameter".to_string(),
            message: "address query parameter is required".to_string(),
        }),
    )
}
