use graphseed_loader::{chunk_count, partition, MAX_BATCH_ITEMS};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_partition_is_lossless_and_ordered(
        entries in prop::collection::vec(any::<u32>(), 0..400),
        size in 1usize..=40,
    ) {
        let chunks = partition(&entries, size);

        prop_assert_eq!(chunks.concat(), entries.clone());
        prop_assert_eq!(chunks.len(), chunk_count(entries.len(), size));
        prop_assert_eq!(chunks.len(), entries.len().div_ceil(size));
        for chunk in &chunks {
            prop_assert!(!chunk.is_empty());
            prop_assert!(chunk.len() <= size);
        }
        // Only the last chunk may be short.
        for chunk in chunks.iter().rev().skip(1) {
            prop_assert_eq!(chunk.len(), size);
        }
    }

    #[test]
    fn prop_provider_limit_is_respected(len in 0usize..1_000) {
        let entries: Vec<usize> = (0..len).collect();
        let chunks = partition(&entries, MAX_BATCH_ITEMS);
        prop_assert!(chunks.iter().all(|c| c.len() <= MAX_BATCH_ITEMS));
        prop_assert_eq!(chunks.len(), (len + MAX_BATCH_ITEMS - 1) / MAX_BATCH_ITEMS);
    }
}
