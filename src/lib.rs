//! Ledger transaction watcher: a block catch-up poller plus a
//! subscription-indexed in-memory transaction store, fronted by a small
//! HTTP API.
//!
//! The store holds no state across restarts; the cursor is primed with
//! the network head at startup, so blocks produced while the process was
//! down are never ingested.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use blockchain::{BlockSource, Poller, PollerConfig, PollerState, RpcClient};
pub use config::{ApiConfig, AppConfig, LoggingConfig, PollerSettings, RpcConfig};
pub use error::{ConfigError, Result, RpcError, WatcherError};
pub use models::TransactionRecord;
pub use store::MemoryStore;
