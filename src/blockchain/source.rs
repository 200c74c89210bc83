use async_trait::async_trait;

use crate::error::RpcError;
use crate::models::TransactionRecord;

/// Ledger access contract consumed by the poller.
///
/// Both operations report failure explicitly. Some ledger clients collapse
/// a failed height fetch into a `0` return, which a caller cannot tell
/// apart from a legitimately empty chain; implementations of this trait
/// must return an error instead, leaving the skip-or-carry-on policy to
/// the caller.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Current chain height as reported by the node.
    async fn latest_network_block(&self) -> Result<u64, RpcError>;

    /// The transactions contained in block `block_number`.
    async fn parse_block(&self, block_number: u64)
        -> Result<Vec<TransactionRecord>, RpcError>;
}
