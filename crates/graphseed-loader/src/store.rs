//! The seam between the loader and a concrete key-value store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::LoaderError;

/// One store item: the record's JSON object, attributes verbatim.
pub type Item = serde_json::Map<String, Value>;

/// Serialize a record into an [`Item`]. Only JSON objects are items.
pub fn to_item<T: Serialize>(record: &T) -> Result<Item, LoaderError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(LoaderError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The `(PK, SK)` primary key of an item, when both are strings.
pub fn item_key(item: &Item) -> Option<(&str, &str)> {
    let pk = item.get("PK")?.as_str()?;
    let sk = item.get("SK")?.as_str()?;
    Some((pk, sk))
}

/// Drop every put whose key reappears later in `puts`.
///
/// A batch-write may touch each key once, so only the last put of a key
/// survives. Survivors keep their relative order; keyless items pass through.
pub fn dedup_keys(puts: Vec<Item>) -> Vec<Item> {
    let last: HashMap<(String, String), usize> = puts
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item_key(item).map(|(pk, sk)| ((pk.to_string(), sk.to_string()), i)))
        .collect();
    if last.len() == puts.len() {
        return puts;
    }

    puts.into_iter()
        .enumerate()
        .filter(|(i, item)| match item_key(item) {
            Some((pk, sk)) => last.get(&(pk.to_string(), sk.to_string())) == Some(i),
            None => true,
        })
        .map(|(_, item)| item)
        .collect()
}

/// A single batch-write request: put every item into `table`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    pub table: String,
    pub puts: Vec<Item>,
}

impl WriteBatch {
    pub fn new(table: impl Into<String>, puts: Vec<Item>) -> Self {
        Self {
            table: table.into(),
            puts,
        }
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }
}

/// What a fulfilled batch-write reports back.
///
/// Per-item results are not inspected; `unprocessed` is informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub unprocessed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("item not representable: {0}")]
    Serialization(String),

    #[error("write task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Transient failures that a retry may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Transport(_) | StoreError::Throttled(_) | StoreError::Timeout(_)
        )
    }
}

/// Executes batch-write requests against a store.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    async fn batch_write(&self, batch: &WriteBatch) -> Result<BatchOutput, StoreError>;
}
