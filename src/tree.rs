//! Counter tree building blocks: item storage, geometry, and the tree
//! itself.
//!
//! The submodules split the concern three ways. [`item`] holds the padded
//! atomic cell every level is made of, [`counter`] implements the tree over
//! a caller-provided slice of those cells, and this root provides the
//! buffer-sizing helpers plus the per-thread shard assignment that backs
//! [`CounterTree::add`](counter::CounterTree::add).

use std::sync::atomic::{AtomicUsize, Ordering};

use self::item::LevelItem;

pub mod counter;
mod geometry;
pub mod item;

/// Children folded into each parent node, leaves upward.
pub(crate) const LEVEL_FANOUT: usize = 4;

static NEXT_SLOT_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static THREAD_SLOT_INDEX: usize = NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed);
}

/// Returns the calling thread's process-wide slot id.
///
/// Ids are handed out in thread-creation order and never reused, so trees
/// reduce them modulo their own shard count. Two threads never share a
/// slot; two threads may share a shard once more threads than shards exist.
pub(crate) fn current_slot() -> usize {
    THREAD_SLOT_INDEX.with(|slot| *slot)
}

/// Returns the shard count matching the machine's available parallelism.
///
/// Falls back to 1 when the parallelism cannot be determined.
///
/// # Examples
///
/// ```rust
/// assert!(alberi::tree::default_shards() >= 1);
/// ```
pub fn default_shards() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// Returns the number of items a tree over `shards` leaves occupies.
///
/// Level widths shrink by the fan-out until a single root remains; the
/// total counts every level. Zero shards occupy zero items.
///
/// # Examples
///
/// ```rust
/// use alberi::tree::items_size;
///
/// assert_eq!(items_size(1), 1);
/// assert_eq!(items_size(4), 5);   // 4 leaves + root
/// assert_eq!(items_size(16), 21); // 16 + 4 + 1
/// ```
#[inline]
pub fn items_size(shards: usize) -> usize {
    geometry::items_size(shards)
}

/// Allocates a zeroed item buffer sized for `shards` leaves.
///
/// Convenience over [`items_size`] for callers without placement
/// requirements; embedders with their own allocation story can build the
/// slice themselves.
///
/// # Examples
///
/// ```rust
/// use alberi::tree::{items_buffer, items_size};
///
/// let items = items_buffer(8);
/// assert_eq!(items.len(), items_size(8));
/// ```
pub fn items_buffer(shards: usize) -> Vec<LevelItem> {
    std::iter::repeat_with(LevelItem::new)
        .take(items_size(shards))
        .collect()
}
