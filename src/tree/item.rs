//! The atomic storage cell backing every tree node.
//!
//! A [`LevelItem`] is one signed machine-word accumulator padded to its own
//! cache line, so adjacent items in the caller's buffer never false-share.
//! The caller allocates a flat buffer of these (see
//! [`items_buffer`](super::items_buffer)) and lends it to a
//! [`CounterTree`](super::counter::CounterTree), which addresses it by level
//! and index.

use std::fmt::Debug;
use std::sync::atomic::{AtomicIsize, Ordering};

use crossbeam_utils::CachePadded;

/// One node of a counter tree: a cache-line-padded atomic accumulator.
///
/// Items carry no identity of their own; whether a given item is a leaf, an
/// internal node, or the root is decided by its position in the buffer. All
/// accesses use relaxed ordering — cross-thread visibility guarantees come
/// from the caller's own synchronization, not from the counter.
///
/// # Memory Usage
///
/// Each item occupies a full cache line (typically 64 bytes), so a buffer
/// for `n` shards costs roughly `items_size(n) * 64` bytes.
///
/// # Examples
///
/// ```rust
/// use alberi::tree::item::LevelItem;
///
/// let items: Vec<LevelItem> = std::iter::repeat_with(LevelItem::new).take(5).collect();
/// assert_eq!(items.len(), 5);
/// ```
pub struct LevelItem {
    count: CachePadded<AtomicIsize>,
}

impl LevelItem {
    /// Creates an item initialized to zero.
    pub const fn new() -> Self {
        LevelItem {
            count: CachePadded::new(AtomicIsize::new(0)),
        }
    }

    /// Returns the current buffered value.
    #[inline]
    pub(crate) fn load(&self) -> isize {
        self.count.load(Ordering::Relaxed)
    }

    /// Adds `delta` and returns the previous value.
    #[inline]
    pub(crate) fn fetch_add(&self, delta: isize) -> isize {
        self.count.fetch_add(delta, Ordering::Relaxed)
    }

    /// Drains the item: swaps the value for zero and returns what was held.
    #[inline]
    pub(crate) fn take(&self) -> isize {
        self.count.swap(0, Ordering::Relaxed)
    }

    /// Resets the item to zero, discarding any held value.
    #[inline]
    pub(crate) fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Default for LevelItem {
    /// Creates an item initialized to zero.
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for LevelItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LevelItem({})", self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero() {
        let item = LevelItem::new();
        assert_eq!(item.load(), 0);
    }

    #[test]
    fn test_fetch_add_returns_previous() {
        let item = LevelItem::new();
        assert_eq!(item.fetch_add(5), 0);
        assert_eq!(item.fetch_add(-8), 5);
        assert_eq!(item.load(), -3);
    }

    #[test]
    fn test_take_drains() {
        let item = LevelItem::new();
        item.fetch_add(42);
        assert_eq!(item.take(), 42);
        assert_eq!(item.load(), 0);
        assert_eq!(item.take(), 0);
    }

    #[test]
    fn test_reset() {
        let item = LevelItem::new();
        item.fetch_add(-7);
        item.reset();
        assert_eq!(item.load(), 0);
    }

    #[test]
    fn test_default() {
        let item = LevelItem::default();
        assert_eq!(item.load(), 0);
    }

    #[test]
    fn test_debug() {
        let item = LevelItem::new();
        item.fetch_add(9);
        assert_eq!(format!("{:?}", item), "LevelItem(9)");
    }
}
