//! Level geometry: how a shard count maps onto a flat item buffer.
//!
//! Level 0 holds one leaf per shard. Each level above it shrinks by the
//! fan-out factor (`ceil(n / LEVEL_FANOUT)`) until a single item remains,
//! which is the root. Levels are laid out back to back in the caller's
//! buffer, leaves first, root last, so a one-shard tree is a single item
//! that is simultaneously leaf and root.

use super::LEVEL_FANOUT;

/// Number of items required for `shards` leaves plus every internal level
/// and the root. Zero shards need zero items.
pub(crate) fn items_size(shards: usize) -> usize {
    if shards == 0 {
        return 0;
    }
    let mut total = shards;
    let mut width = shards;
    while width > 1 {
        width = width.div_ceil(LEVEL_FANOUT);
        total += width;
    }
    total
}

/// Per-level sizes and flat offsets for one tree instance.
#[derive(Debug, Clone)]
pub(crate) struct Geometry {
    sizes: Vec<usize>,
    offsets: Vec<usize>,
    total: usize,
}

impl Geometry {
    /// Derives the geometry for a nonzero shard count.
    pub(crate) fn for_shards(shards: usize) -> Self {
        debug_assert!(shards > 0);
        let mut sizes = vec![shards];
        let mut width = shards;
        while width > 1 {
            width = width.div_ceil(LEVEL_FANOUT);
            sizes.push(width);
        }
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut total = 0;
        for &len in &sizes {
            offsets.push(total);
            total += len;
        }
        Geometry {
            sizes,
            offsets,
            total,
        }
    }

    #[inline]
    pub(crate) fn shard_count(&self) -> usize {
        self.sizes[0]
    }

    #[inline]
    pub(crate) fn level_count(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub(crate) fn level_len(&self, level: usize) -> usize {
        self.sizes[level]
    }

    #[inline]
    pub(crate) fn total_items(&self) -> usize {
        self.total
    }

    /// Flat buffer position of node `index` at `level`.
    #[inline]
    pub(crate) fn flat_index(&self, level: usize, index: usize) -> usize {
        debug_assert!(index < self.sizes[level]);
        self.offsets[level] + index
    }

    /// Flat buffer position of the root (always the last used item).
    #[inline]
    pub(crate) fn root_index(&self) -> usize {
        self.total - 1
    }
}
