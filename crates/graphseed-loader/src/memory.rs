//! In-memory [`BatchWriter`] with last-write-wins semantics across batches.
//!
//! Like DynamoDB, a single batch that puts the same key twice is rejected.
//! Backs `seed --dry-run` and the loader tests. Failures can be injected by
//! partition key (permanent) or as a number of leading transient failures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::store::{item_key, BatchOutput, BatchWriter, Item, StoreError, WriteBatch};

type Table = HashMap<(String, String), Item>;

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Table>>,
    calls: AtomicUsize,
    transient_failures: AtomicUsize,
    rejected_partition_keys: HashSet<String>,
    latency: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any batch containing an item with this partition key.
    pub fn rejecting_partition_key(mut self, partition_key: impl Into<String>) -> Self {
        self.rejected_partition_keys.insert(partition_key.into());
        self
    }

    /// Throttle the first `n` calls.
    pub fn with_transient_failures(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Sleep this long inside every call before applying it.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `batch_write` calls received, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn item_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, HashMap::len)
    }

    /// Item counts per table, sorted by table name.
    pub fn table_counts(&self) -> BTreeMap<String, usize> {
        self.tables
            .lock()
            .iter()
            .map(|(name, table)| (name.clone(), table.len()))
            .collect()
    }

    pub fn get(&self, table: &str, partition_key: &str, sort_key: &str) -> Option<Item> {
        self.tables
            .lock()
            .get(table)?
            .get(&(partition_key.to_string(), sort_key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BatchWriter for InMemoryStore {
    async fn batch_write(&self, batch: &WriteBatch) -> Result<BatchOutput, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let throttled = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if throttled {
            return Err(StoreError::Throttled("injected transient failure".to_string()));
        }

        let mut keyed = Vec::with_capacity(batch.len());
        let mut seen = HashSet::with_capacity(batch.len());
        for item in &batch.puts {
            let (pk, sk) = item_key(item).ok_or_else(|| {
                StoreError::Rejected("item is missing string PK/SK attributes".to_string())
            })?;
            if self.rejected_partition_keys.contains(pk) {
                return Err(StoreError::Rejected(format!(
                    "injected rejection for partition key {pk}"
                )));
            }
            if !seen.insert((pk, sk)) {
                return Err(StoreError::Rejected(format!(
                    "batch contains duplicate key ({pk}, {sk})"
                )));
            }
            keyed.push(((pk.to_string(), sk.to_string()), item.clone()));
        }

        let mut tables = self.tables.lock();
        let table = tables.entry(batch.table.clone()).or_default();
        for (key, item) in keyed {
            table.insert(key, item);
        }
        Ok(BatchOutput::default())
    }
}
