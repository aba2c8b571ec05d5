//! Concurrent bulk loading with per-batch settlement.
//!
//! [`BulkLoader::load`] partitions entries, builds one [`WriteBatch`] per
//! chunk (keeping only the last put of any key repeated inside it), and spawns every batch immediately onto the caller's
//! [`PendingWrites`]. Nothing is awaited until [`PendingWrites::settle`],
//! which waits for every batch (in any completion order) and reports each
//! one individually. A rejected batch never cancels its siblings.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::LoaderError;
use crate::partition::{partition, MAX_BATCH_ITEMS};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::store::{dedup_keys, to_item, BatchOutput, BatchWriter, StoreError, WriteBatch};

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Items per batch, capped at the provider limit [`MAX_BATCH_ITEMS`].
    pub chunk_size: usize,
    pub retry: RetryPolicy,
    /// Per-attempt deadline. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: MAX_BATCH_ITEMS,
            retry: RetryPolicy::disabled(),
            timeout: None,
        }
    }
}

/// Resolved outcome of one batch-write request.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Fulfilled(BatchOutput),
    Rejected(StoreError),
}

impl Settlement {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Dispatch ordinal across the whole run.
    pub batch: usize,
    pub table: String,
    pub items: usize,
    pub attempts: usize,
    pub settlement: Settlement,
}

/// In-flight batch writes, owned by the caller and threaded through every
/// [`BulkLoader::load`] call of a run.
#[derive(Default)]
pub struct PendingWrites {
    tasks: JoinSet<WriteOutcome>,
    dispatched: Vec<(String, usize)>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests dispatched so far.
    pub fn len(&self) -> usize {
        self.dispatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatched.is_empty()
    }

    /// Wait for every dispatched request and report each settlement, ordered
    /// by dispatch ordinal.
    pub async fn settle(mut self) -> SettlementReport {
        let mut slots: Vec<Option<WriteOutcome>> = vec![None; self.dispatched.len()];
        let mut join_failures = Vec::new();

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    let index = outcome.batch;
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => join_failures.push(e.to_string()),
            }
        }

        let mut join_failures = join_failures.into_iter();
        let outcomes = slots
            .into_iter()
            .zip(self.dispatched)
            .enumerate()
            .map(|(batch, (slot, (table, items)))| {
                slot.unwrap_or_else(|| WriteOutcome {
                    batch,
                    table,
                    items,
                    attempts: 0,
                    settlement: Settlement::Rejected(StoreError::Task(
                        join_failures
                            .next()
                            .unwrap_or_else(|| "write task did not complete".to_string()),
                    )),
                })
            })
            .collect();

        SettlementReport { outcomes }
    }
}

pub struct BulkLoader {
    writer: Arc<dyn BatchWriter>,
    config: LoaderConfig,
}

impl BulkLoader {
    pub fn new(writer: Arc<dyn BatchWriter>, config: LoaderConfig) -> Self {
        Self { writer, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Dispatch one batch-write per chunk of `entries` into `table`.
    ///
    /// Every record is converted up front, so a record that is not a JSON
    /// object fails the call before any request for it is issued. Returns the
    /// number of requests dispatched. Must run inside a tokio runtime.
    ///
    /// A key repeated within one chunk is written once, with its last value;
    /// the outcome's `items` counts the puts actually sent.
    pub fn load<T: Serialize>(
        &self,
        pending: &mut PendingWrites,
        table: &str,
        entries: &[T],
    ) -> Result<usize, LoaderError> {
        let items = entries.iter().map(to_item).collect::<Result<Vec<_>, _>>()?;
        let chunks = partition(&items, self.config.chunk_size.min(MAX_BATCH_ITEMS));
        let requests = chunks.len();

        for chunk in chunks {
            let batch = WriteBatch::new(table, dedup_keys(chunk.to_vec()));
            let ordinal = pending.dispatched.len();
            if batch.len() < chunk.len() {
                debug!(
                    table,
                    batch = ordinal,
                    dropped = chunk.len() - batch.len(),
                    "collapsed repeated keys in batch"
                );
            }
            pending.dispatched.push((batch.table.clone(), batch.len()));

            let writer = Arc::clone(&self.writer);
            let retry = self.config.retry.clone();
            let timeout = self.config.timeout;
            debug!(table, batch = ordinal, items = batch.len(), "dispatching batch write");

            pending.tasks.spawn(async move {
                let (result, attempts) = retry_with_backoff(&retry, || {
                    write_once(writer.as_ref(), &batch, timeout)
                })
                .await;

                let settlement = match result {
                    Ok(output) => Settlement::Fulfilled(output),
                    Err(err) => {
                        warn!(table = %batch.table, batch = ordinal, attempts, error = %err, "batch write rejected");
                        Settlement::Rejected(err)
                    }
                };
                WriteOutcome {
                    batch: ordinal,
                    table: batch.table,
                    items: batch.puts.len(),
                    attempts,
                    settlement,
                }
            });
        }

        Ok(requests)
    }
}

async fn write_once(
    writer: &dyn BatchWriter,
    batch: &WriteBatch,
    timeout: Option<Duration>,
) -> Result<BatchOutput, StoreError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, writer.batch_write(batch))
            .await
            .unwrap_or(Err(StoreError::Timeout(limit))),
        None => writer.batch_write(batch).await,
    }
}

/// Per-table aggregate of a [`SettlementReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSummary {
    pub requests: usize,
    pub fulfilled: usize,
    pub rejected: usize,
    pub items_written: usize,
    pub items_failed: usize,
}

/// Every settlement of a run, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementReport {
    pub outcomes: Vec<WriteOutcome>,
}

impl SettlementReport {
    pub fn fulfilled(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.outcomes.iter().filter(|o| o.settlement.is_fulfilled())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &WriteOutcome> {
        self.outcomes.iter().filter(|o| !o.settlement.is_fulfilled())
    }

    pub fn fulfilled_count(&self) -> usize {
        self.fulfilled().count()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected().count()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected_count() == 0
    }

    pub fn by_table(&self) -> BTreeMap<&str, TableSummary> {
        let mut tables: BTreeMap<&str, TableSummary> = BTreeMap::new();
        for outcome in &self.outcomes {
            let summary = tables.entry(outcome.table.as_str()).or_default();
            summary.requests += 1;
            if outcome.settlement.is_fulfilled() {
                summary.fulfilled += 1;
                summary.items_written += outcome.items;
            } else {
                summary.rejected += 1;
                summary.items_failed += outcome.items;
            }
        }
        tables
    }
}
