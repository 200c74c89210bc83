use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::TransactionRecord;

/// In-memory subscription store: the block cursor, the subscribed-address
/// set, and the per-address transaction index.
///
/// Every public operation takes the single internal lock exactly once, so
/// no two operations interleave their effects. Separate calls remain
/// independent transactions: there is no combined check-cursor-and-save
/// operation, and callers composing several calls must tolerate the
/// intermediate states becoming visible.
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    /// Highest block fully processed. Monotonicity is the caller's duty.
    current_block: u64,
    subscriptions: HashSet<String>,
    transactions: HashMap<String, Vec<TransactionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // The maps stay valid even if a previous holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cursor, the highest block number fully processed.
    pub fn current_block(&self) -> u64 {
        self.lock().current_block
    }

    /// Overwrites the cursor unconditionally; values below the current
    /// cursor are accepted as-is.
    pub fn set_current_block(&self, block_number: u64) {
        self.lock().current_block = block_number;
    }

    /// Adds an address to the subscription set. Returns `false` when the
    /// address was already subscribed; subscriptions are never removed.
    pub fn subscribe(&self, address: &str) -> bool {
        self.lock().subscriptions.insert(address.to_string())
    }

    /// Returns a snapshot of the records stored for `address`, in
    /// block-processing order. Never-populated addresses yield an empty
    /// list.
    pub fn transactions(&self, address: &str) -> Vec<TransactionRecord> {
        self.lock()
            .transactions
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Appends each record under its `from` and `to` addresses, each side
    /// gated on that address being subscribed at this moment. A subscribed
    /// self-transfer therefore lands twice; records touching no
    /// subscription are dropped without a trace.
    pub fn save_transactions(&self, records: &[TransactionRecord]) {
        let mut state = self.lock();
        for record in records {
            if state.subscriptions.contains(&record.from) {
                state
                    .transactions
                    .entry(record.from.clone())
                    .or_default()
                    .push(record.clone());
            }
            if state.subscriptions.contains(&record.to) {
                state
                    .transactions
                    .entry(record.to.clone())
                    .or_default()
                    .push(record.clone());
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(block: u64, from: &str, to: &str) -> TransactionRecord {
        TransactionRecord {
            hash: format!("0xhash{}", block),
            from: from.to_string(),
            to: to.to_string(),
            value: "0x1".to_string(),
            block_number: block.to_string(),
        }
    }

    #[test]
    fn test_subscribe_is_true_exactly_once() {
        let store = MemoryStore::new();

        assert!(store.subscribe("0xabc"));
        assert!(!store.subscribe("0xabc"));
        assert!(!store.subscribe("0xabc"));
        assert!(store.subscribe("0xdef"));
    }

    #[test]
    fn test_cursor_write_through() {
        let store = MemoryStore::new();
        assert_eq!(store.current_block(), 0);

        store.set_current_block(100);
        assert_eq!(store.current_block(), 100);

        // No monotonicity enforcement: a lower value wins too.
        store.set_current_block(50);
        assert_eq!(store.current_block(), 50);
    }

    #[test]
    fn test_unsubscribed_records_are_dropped() {
        let store = MemoryStore::new();

        store.save_transactions(&[record(1, "0xabc", "0xdef")]);

        assert!(store.transactions("0xabc").is_empty());
        assert!(store.transactions("0xdef").is_empty());
    }

    #[test]
    fn test_only_subscribed_side_is_indexed() {
        let store = MemoryStore::new();
        store.subscribe("0xabc");

        store.save_transactions(&[record(1, "0xabc", "0xdef")]);

        assert_eq!(store.transactions("0xabc").len(), 1);
        assert!(store.transactions("0xdef").is_empty());
    }

    #[test]
    fn test_both_sides_subscribed_appends_once_each() {
        let store = MemoryStore::new();
        store.subscribe("0xabc");
        store.subscribe("0xdef");

        store.save_transactions(&[record(1, "0xabc", "0xdef")]);

        assert_eq!(store.transactions("0xabc").len(), 1);
        assert_eq!(store.transactions("0xdef").len(), 1);
    }

    #[test]
    fn test_self_transfer_is_appended_twice() {
        let store = MemoryStore::new();
        store.subscribe("0xabc");

        store.save_transactions(&[record(7, "0xabc", "0xabc")]);

        let stored = store.transactions("0xabc");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], stored[1]);
    }

    #[test]
    fn test_late_subscription_does_not_backfill() {
        let store = MemoryStore::new();

        store.save_transactions(&[record(1, "0xabc", "0xdef")]);
        store.subscribe("0xabc");

        assert!(store.transactions("0xabc").is_empty());

        store.save_transactions(&[record(2, "0xabc", "0xdef")]);
        let stored = store.transactions("0xabc");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].block_number, "2");
    }

    #[test]
    fn test_records_keep_block_processing_order() {
        let store = MemoryStore::new();
        store.subscribe("0xabc");

        store.save_transactions(&[record(3, "0xabc", "0x1")]);
        store.save_transactions(&[record(1, "0xabc", "0x2")]);
        store.save_transactions(&[record(2, "0xabc", "0x3")]);

        let blocks: Vec<_> = store
            .transactions("0xabc")
            .iter()
            .map(|r| r.block_number.clone())
            .collect();
        assert_eq!(blocks, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_transactions_returns_a_snapshot() {
        let store = MemoryStore::new();
        store.subscribe("0xabc");
        store.save_transactions(&[record(1, "0xabc", "0xdef")]);

        let snapshot = store.transactions("0xabc");
        store.save_transactions(&[record(2, "0xabc", "0xdef")]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.transactions("0xabc").len(), 2);
    }

    #[test]
    fn test_unknown_address_yields_empty_list() {
        let store = MemoryStore::new();
        assert!(store.transactions("0xnever").is_empty());
    }
}
