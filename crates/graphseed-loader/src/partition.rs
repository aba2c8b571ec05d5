//! Fixed-size partitioning of write entries.

/// Maximum put operations accepted by a single batch-write call.
pub const MAX_BATCH_ITEMS: usize = 25;

/// Split `entries` into consecutive chunks of at most `size` elements.
///
/// Order is preserved and nothing is dropped or duplicated: concatenating the
/// chunks yields `entries`, and there are `ceil(len / size)` of them. A `size`
/// of zero is treated as one.
pub fn partition<T>(entries: &[T], size: usize) -> Vec<&[T]> {
    entries.chunks(size.max(1)).collect()
}

/// Number of chunks [`partition`] produces for `len` entries.
pub fn chunk_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}
