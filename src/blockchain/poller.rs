use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::blockchain::BlockSource;
use crate::error::RpcError;
use crate::store::MemoryStore;

/// Lifecycle of the poller. Once `Stopped`, a poller never polls again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Stopped,
}

const STATE_IDLE: u8 = 0;
const STATE_POLLING: u8 = 1;
const STATE_STOPPED: u8 = 2;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Sleep between catch-up ticks, in seconds. Tuned below the ledger's
    /// average block time so backlogs stay small.
    pub poll_interval_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
        }
    }
}

/// Drives the block catch-up loop: compares the store cursor to the
/// network head, filters every intervening block through the store, and
/// advances the cursor once per tick.
pub struct Poller<S> {
    source: S,
    store: Arc<MemoryStore>,
    config: PollerConfig,
    state: AtomicU8,
    shutdown_signal: Arc<AtomicBool>,
}

impl<S: BlockSource> Poller<S> {
    /// Builds a poller and primes the store cursor with the current
    /// network head, so ingestion starts at the chain tip rather than at
    /// genesis. A node that cannot report its head here is a hard error.
    pub async fn new(
        source: S,
        store: Arc<MemoryStore>,
        config: PollerConfig,
    ) -> Result<Self, RpcError> {
        let head = source.latest_network_block().await?;
        store.set_current_block(head);
        info!("poller starting from block {}", head);

        Ok(Self {
            source,
            store,
            config,
            state: AtomicU8::new(STATE_IDLE),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle for requesting shutdown from another task.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_signal)
    }

    /// Requests a cooperative shutdown. The request is honored at the
    /// next tick boundary; a backlog already being drained finishes
    /// first.
    pub fn shutdown(&self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }

    pub fn state(&self) -> PollerState {
        match self.state.load(Ordering::Relaxed) {
            STATE_IDLE => PollerState::Idle,
            STATE_POLLING => PollerState::Polling,
            _ => PollerState::Stopped,
        }
    }

    /// Runs the catch-up loop until shutdown is requested. The shutdown
    /// flag is read once per tick, before the backlog is drained, never
    /// inside it.
    pub async fn run(&self) {
        if self.state.load(Ordering::Relaxed) == STATE_STOPPED {
            return;
        }
        self.state.store(STATE_POLLING, Ordering::Relaxed);
        info!(
            "polling for new blocks every {}s",
            self.config.poll_interval_seconds
        );

        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                break;
            }
            self.tick().await;
            sleep(Duration::from_secs(self.config.poll_interval_seconds)).await;
        }

        self.state.store(STATE_STOPPED, Ordering::Relaxed);
        info!("block polling stopped");
    }

    /// One catch-up pass: fetch the head, drain `cursor+1..=head`
    /// sequentially, then move the cursor to the head in a single write.
    pub async fn tick(&self) {
        let head = match self.source.latest_network_block().await {
            Ok(head) => head,
            Err(e) => {
                warn!("failed to fetch network head, skipping tick: {}", e);
                return;
            }
        };

        let cursor = self.store.current_block();
        for block_number in cursor + 1..=head {
            match self.source.parse_block(block_number).await {
                Ok(records) => {
                    debug!(
                        "processed block {} with {} transactions",
                        block_number,
                        records.len()
                    );
                    self.store.save_transactions(&records);
                }
                Err(e) => {
                    // The cursor still moves past this block at the end
                    // of the tick; its transactions are lost for good.
                    warn!("failed to parse block {}: {}", block_number, e);
                }
            }
        }

        self.store.set_current_block(head);
    }
}
