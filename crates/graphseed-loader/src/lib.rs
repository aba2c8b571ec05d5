//! Graphseed loader
//!
//! Writes fixture records into a key-value store in provider-sized batches:
//!
//! ```text
//! entries ──► partition (≤25) ──► WriteBatch per chunk ──► spawn ──┐
//!                                                                 │  all in flight
//! entries ──► partition (≤25) ──► WriteBatch per chunk ──► spawn ──┤  before any
//!                                                                 │  result is read
//!                                        PendingWrites::settle ◄──┘
//!                                                │
//!                                                ▼
//!                                  SettlementReport (one line per batch)
//! ```
//!
//! The store is reached through [`BatchWriter`]; [`DynamoDbWriter`] talks to
//! DynamoDB and [`InMemoryStore`] keeps everything in process.

pub mod dynamodb;
pub mod error;
pub mod loader;
pub mod memory;
pub mod partition;
pub mod retry;
pub mod store;

pub use dynamodb::DynamoDbWriter;
pub use error::LoaderError;
pub use loader::{
    BulkLoader, LoaderConfig, PendingWrites, Settlement, SettlementReport, TableSummary,
    WriteOutcome,
};
pub use memory::InMemoryStore;
pub use partition::{chunk_count, partition, MAX_BATCH_ITEMS};
pub use retry::RetryPolicy;
pub use store::{to_item, BatchOutput, BatchWriter, Item, StoreError, WriteBatch};
