//! Integration tests for the complete Graphseed pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Fixtures → Bulk loader → In-memory store
//! - Fixtures → Snapshot file → User sampling → Query request
//!
//! Run with: cargo test --test integration_tests

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use graphseed_fixtures::{Dataset, EntityKind, Record, ScaleConfig};
use graphseed_loader::{
    chunk_count, BulkLoader, InMemoryStore, LoaderConfig, PendingWrites, RetryPolicy, Settlement,
    MAX_BATCH_ITEMS,
};
use graphseed_loadtest::{sample_from_dataset, QueryTemplate};

// ============================================================================
// Generate → load
// ============================================================================

#[tokio::test]
async fn test_generate_and_load_every_kind() {
    let dataset = Dataset::seeded(2024, &ScaleConfig::new(30, 20, 10)).unwrap();
    let store = Arc::new(InMemoryStore::new());
    let loader = BulkLoader::new(store.clone(), LoaderConfig::default());
    let mut pending = PendingWrites::new();

    let mut expected_requests = 0;
    for kind in EntityKind::ALL {
        let records = dataset.records(kind);
        let dispatched = loader.load(&mut pending, kind.as_str(), &records).unwrap();
        assert_eq!(dispatched, chunk_count(records.len(), MAX_BATCH_ITEMS));
        expected_requests += dispatched;
    }
    let combined = dataset.combined();
    expected_requests += loader.load(&mut pending, "combined", &combined).unwrap();

    assert_eq!(pending.len(), expected_requests);
    let report = pending.settle().await;
    assert!(report.is_clean());
    assert_eq!(report.outcomes.len(), expected_requests);
    assert_eq!(store.calls(), expected_requests);
    assert!(report.outcomes.iter().all(|o| o.items <= MAX_BATCH_ITEMS));

    for kind in EntityKind::ALL {
        let keys: HashSet<(String, String)> = dataset
            .records(kind)
            .iter()
            .map(|r| (r.partition_key().to_string(), r.sort_key().to_string()))
            .collect();
        assert_eq!(store.item_count(kind.as_str()), keys.len(), "{kind}");
    }

    let user = &dataset.users[0];
    let item = store
        .get("combined", user.partition_key(), user.sort_key())
        .unwrap();
    assert_eq!(item["__typename"], "USER");
    assert_eq!(item["email"], user.email.as_str());
}

#[tokio::test]
async fn test_one_bad_batch_does_not_stop_the_rest() {
    let dataset = Dataset::seeded(7, &ScaleConfig::new(60, 10, 5)).unwrap();
    let poisoned = dataset.movies[30].partition_key().to_string();
    let store = Arc::new(InMemoryStore::new().rejecting_partition_key(poisoned));
    let loader = BulkLoader::new(store.clone(), LoaderConfig::default());
    let mut pending = PendingWrites::new();

    loader.load(&mut pending, "movies", &dataset.movies).unwrap();
    loader.load(&mut pending, "users", &dataset.users).unwrap();
    let report = pending.settle().await;

    assert_eq!(report.rejected_count(), 1);
    let rejected = report.rejected().next().unwrap();
    assert_eq!(rejected.table, "movies");
    assert_eq!(rejected.batch, 1);
    assert!(matches!(rejected.settlement, Settlement::Rejected(_)));

    let by_table = report.by_table();
    let summary = &by_table["users"];
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.items_written, dataset.users.len());
}

#[tokio::test]
async fn test_throttled_batches_recover_with_retry() {
    let dataset = Dataset::seeded(9, &ScaleConfig::new(10, 10, 3)).unwrap();
    let store = Arc::new(InMemoryStore::new().with_transient_failures(2));
    let config = LoaderConfig {
        retry: RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            ..RetryPolicy::disabled().with_max_retries(3)
        },
        ..LoaderConfig::default()
    };
    let loader = BulkLoader::new(store.clone(), config);
    let mut pending = PendingWrites::new();

    loader.load(&mut pending, "users", &dataset.users).unwrap();
    let report = pending.settle().await;

    assert!(report.is_clean());
    assert_eq!(store.item_count("users"), dataset.users.len());
}

// ============================================================================
// Snapshot → load test input
// ============================================================================

#[test]
fn test_snapshot_feeds_user_sampling() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("loaded-data.json");

    let dataset = Dataset::seeded(42, &ScaleConfig::new(5, 8, 3)).unwrap();
    dataset.write_snapshot(&path).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for key in ["movies", "users", "reviews", "lists", "associations", "relationships"] {
        assert!(raw[key].is_array(), "snapshot is missing {key}");
    }

    let restored = Dataset::read_snapshot(&path).unwrap();
    assert_eq!(restored, dataset);

    let mut rng = StdRng::seed_from_u64(1);
    let user_id = sample_from_dataset(&mut rng, &restored).unwrap();
    assert!(user_id.starts_with("USER#"));

    let request = QueryTemplate::find("query2").unwrap().for_user(&user_id);
    assert_eq!(request.variables["userID"], user_id.as_str());
    assert_eq!(request.operation_name, "MyQuery");
}
