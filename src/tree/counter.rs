//! The counter tree: a sharded counter with bounded-error fast reads.
//!
//! This module provides [`CounterTree`], a signed counter whose hot path is
//! one relaxed atomic add on a per-shard leaf. Buffered deltas ripple upward
//! in batches, so the root always holds an estimate whose distance from the
//! truth is bounded by [`CounterTree::approximate_accuracy_range`]. The
//! exact total is available on demand through the slower
//! [`CounterTree::precise_sum`].

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::{Result, TreeError};

use super::geometry::Geometry;
use super::item::LevelItem;
use super::{current_slot, LEVEL_FANOUT};

/// A hierarchical sharded counter over a caller-owned item buffer.
///
/// Writers add signed deltas to their own leaf; once a leaf's buffered
/// magnitude exceeds the batch size, the whole buffered value is exchanged
/// for zero and folded into the parent node, and the same rule repeats up
/// the levels. The root absorbs everything that reaches it, so reading it is
/// an O(1) approximation of the total, while summing every item yields the
/// exact value.
///
/// The tree does not own its storage: it borrows a slice of
/// [`LevelItem`](super::item::LevelItem)s allocated by the caller (sized via
/// [`items_size`](super::items_size) or produced by
/// [`items_buffer`](super::items_buffer)). Dropping the tree releases only
/// its own bookkeeping; the buffer stays with the caller and can be reused
/// for a fresh tree, which re-zeroes it on construction.
///
/// # Performance
///
/// `add` costs one relaxed `fetch_add` in the common case and at most one
/// exchange-plus-add per level when flushing. `approximate_sum` is a single
/// atomic load regardless of shard count; `precise_sum` reads every item
/// once.
///
/// # Examples
///
/// ```rust
/// use alberi::tree::counter::CounterTree;
/// use alberi::tree::items_buffer;
///
/// let items = items_buffer(4);
/// let tree = CounterTree::with_shards(&items, 32, 4).unwrap();
///
/// tree.add(100); // exceeds the batch, propagates to the root
/// tree.add(3);   // stays buffered in the calling thread's leaf
///
/// assert_eq!(tree.precise_sum(), 103);
/// assert_eq!(tree.approximate_sum(), 100);
///
/// let range = tree.approximate_accuracy_range();
/// assert_eq!((range.under, range.over), (128, 128));
/// ```
///
/// Buffer reuse after drop:
///
/// ```rust
/// use alberi::tree::counter::CounterTree;
/// use alberi::tree::items_buffer;
///
/// let items = items_buffer(2);
/// {
///     let tree = CounterTree::with_shards(&items, 8, 2).unwrap();
///     tree.add(3);
/// }
/// let tree = CounterTree::with_shards(&items, 8, 2).unwrap();
/// assert_eq!(tree.precise_sum(), 0);
/// ```
pub struct CounterTree<'a> {
    name: &'static str,
    batch_size: usize,
    inaccuracy: usize,
    geometry: Geometry,
    items: &'a [LevelItem],
}

/// Proven bounds on how far an approximate read may sit from the truth.
///
/// `under` is the maximum undershoot and `over` the maximum overshoot. With
/// sign-agnostic buffering both sides are equal, but callers should treat
/// them independently.
///
/// # Examples
///
/// ```rust
/// use alberi::tree::counter::AccuracyRange;
///
/// let range = AccuracyRange { under: 10, over: 20 };
/// assert_eq!(range.min_max(50), (40, 70));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccuracyRange {
    /// Maximum amount the approximate sum can undershoot the true total.
    pub under: usize,
    /// Maximum amount the approximate sum can overshoot the true total.
    pub over: usize,
}

impl AccuracyRange {
    /// Applies the range to an approximate reading, yielding the provable
    /// `[min, max]` interval for the true total.
    #[inline]
    pub fn min_max(&self, approximate_sum: isize) -> (isize, isize) {
        approximate_min_max_range(approximate_sum, self.under, self.over)
    }
}

/// Reconstructs the provable `[min, max]` bounds on the true total from an
/// approximate reading and its accuracy parameters.
///
/// Arithmetic saturates at the `isize` extremes.
///
/// # Examples
///
/// ```rust
/// use alberi::tree::counter::approximate_min_max_range;
///
/// assert_eq!(approximate_min_max_range(100, 32, 32), (68, 132));
/// assert_eq!(approximate_min_max_range(isize::MIN, 1, 0).0, isize::MIN);
/// ```
#[inline]
pub fn approximate_min_max_range(approximate_sum: isize, under: usize, over: usize) -> (isize, isize) {
    (
        approximate_sum.saturating_sub_unsigned(under),
        approximate_sum.saturating_add_unsigned(over),
    )
}

impl<'a> CounterTree<'a> {
    /// Creates a tree with one leaf per unit of available parallelism.
    ///
    /// Equivalent to [`with_shards`](Self::with_shards) called with
    /// [`default_shards()`](super::default_shards); size the buffer with
    /// `items_buffer(default_shards())`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::{default_shards, items_buffer};
    ///
    /// let items = items_buffer(default_shards());
    /// let tree = CounterTree::new(&items, 64).unwrap();
    /// assert_eq!(tree.batch_size(), 64);
    /// assert_eq!(tree.shard_count(), default_shards());
    /// ```
    pub fn new(items: &'a [LevelItem], batch_size: usize) -> Result<Self> {
        Self::with_shards(items, batch_size, super::default_shards())
    }

    /// Creates a tree with an explicit shard count over `items`.
    ///
    /// The buffer must hold at least [`items_size(shards)`](super::items_size)
    /// entries; a longer buffer is fine, the tail is simply not used. Every
    /// item the tree will use is reset to zero, so recycled or dirty buffers
    /// are safe. A `batch_size` of zero is degenerate but valid: every
    /// nonzero delta propagates immediately and the accuracy range is zero.
    ///
    /// # Errors
    ///
    /// * [`TreeError::NoShards`] if `shards` is zero.
    /// * [`TreeError::BatchSizeTooLarge`] if `batch_size` exceeds
    ///   `isize::MAX`.
    /// * [`TreeError::ItemsTooSmall`] if the buffer cannot hold the derived
    ///   geometry.
    /// * [`TreeError::AccuracyOverflow`] if the accuracy bound is not
    ///   representable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(8);
    /// assert!(CounterTree::with_shards(&items, 32, 8).is_ok());
    /// assert!(CounterTree::with_shards(&items, 32, 0).is_err());
    /// assert!(CounterTree::with_shards(&items, 32, 16).is_err()); // buffer sized for 8
    /// ```
    pub fn with_shards(items: &'a [LevelItem], batch_size: usize, shards: usize) -> Result<Self> {
        if shards == 0 {
            return Err(TreeError::NoShards);
        }
        if batch_size > isize::MAX as usize {
            return Err(TreeError::BatchSizeTooLarge(batch_size));
        }
        let geometry = Geometry::for_shards(shards);
        let needed = geometry.total_items();
        if items.len() < needed {
            return Err(TreeError::ItemsTooSmall {
                shards,
                needed,
                got: items.len(),
            });
        }
        let inaccuracy = (needed - 1)
            .checked_mul(batch_size)
            .filter(|&bound| bound <= isize::MAX as usize)
            .ok_or(TreeError::AccuracyOverflow {
                items: needed,
                batch_size,
            })?;
        let items = &items[..needed];
        for item in items {
            item.reset();
        }
        Ok(CounterTree {
            name: "",
            batch_size,
            inaccuracy,
            geometry,
            items,
        })
    }

    /// Sets the name of this tree, returning `self` for method chaining.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(2);
    /// let tree = CounterTree::with_shards(&items, 8, 2)
    ///     .unwrap()
    ///     .with_name("open_files");
    /// assert_eq!(tree.name(), "open_files");
    /// ```
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Returns the name of this tree.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the per-item flush threshold.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the number of leaf shards.
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.geometry.shard_count()
    }

    /// Returns the number of levels, root included.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.geometry.level_count()
    }

    /// Returns the number of items the tree uses.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.geometry.total_items()
    }

    /// Returns the symmetric accuracy bound, `(item_count - 1) * batch_size`.
    #[inline]
    pub fn inaccuracy(&self) -> usize {
        self.inaccuracy
    }

    /// Adds a value (positive or negative) through the calling thread's
    /// shard.
    ///
    /// Threads are spread round-robin over the shards by a process-wide
    /// slot assignment, so concurrent callers mostly touch distinct leaves.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(2);
    /// let tree = CounterTree::with_shards(&items, 8, 2).unwrap();
    /// tree.add(5);
    /// tree.add(-2);
    /// assert_eq!(tree.precise_sum(), 3);
    /// ```
    #[inline]
    pub fn add(&self, delta: isize) {
        self.add_to_shard(current_slot() % self.geometry.shard_count(), delta);
    }

    /// Subtracts a value through the calling thread's shard.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(2);
    /// let tree = CounterTree::with_shards(&items, 8, 2).unwrap();
    /// tree.add(10); // exceeds the batch, reaches the root
    /// tree.sub(4);  // buffered
    /// assert_eq!(tree.precise_sum(), 6);
    /// ```
    #[inline]
    pub fn sub(&self, delta: isize) {
        self.add(delta.wrapping_neg());
    }

    /// Adds a value through an explicit shard.
    ///
    /// This is the placement-aware variant of [`add`](Self::add) for callers
    /// with their own notion of execution context (pinned workers, async
    /// tasks carrying a shard id, test harnesses).
    ///
    /// The delta lands in shard `shard`'s leaf; if the leaf's buffered
    /// magnitude now exceeds the batch size, the whole leaf value is
    /// exchanged for zero and folded into its parent, and the same
    /// check-and-flush repeats level by level. The walk stops as soon as a
    /// node stays within bound, a drain finds the node already emptied by a
    /// sibling flusher, or the carry reaches the root, which absorbs it
    /// unconditionally.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= self.shard_count()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(4);
    /// let tree = CounterTree::with_shards(&items, 16, 4).unwrap();
    /// tree.add_to_shard(0, 9);
    /// tree.add_to_shard(3, 9);
    /// assert_eq!(tree.precise_sum(), 18);
    /// assert_eq!(tree.approximate_sum(), 0); // both deltas still buffered
    /// ```
    pub fn add_to_shard(&self, shard: usize, delta: isize) {
        assert!(
            shard < self.geometry.shard_count(),
            "shard {} out of range for {} shards",
            shard,
            self.geometry.shard_count()
        );
        if delta == 0 {
            return;
        }
        let top = self.geometry.level_count() - 1;
        let mut index = shard;
        let mut carry = delta;
        for level in 0..top {
            let item = self.item(level, index);
            let value = item.fetch_add(carry).wrapping_add(carry);
            if value.unsigned_abs() <= self.batch_size {
                return;
            }
            carry = item.take();
            if carry == 0 {
                // A sibling flusher drained this node, our delta included;
                // that flusher carries it upward.
                return;
            }
            index /= LEVEL_FANOUT;
        }
        self.item(top, 0).fetch_add(carry);
    }

    /// Returns the root's estimate of the total with a single atomic load.
    ///
    /// The result differs from the true total by at most the bounds in
    /// [`approximate_accuracy_range`](Self::approximate_accuracy_range).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(2);
    /// let tree = CounterTree::with_shards(&items, 4, 2).unwrap();
    /// tree.add_to_shard(0, 3);
    /// assert_eq!(tree.approximate_sum(), 0); // buffered in the leaf
    /// tree.add_to_shard(0, 3);               // 6 exceeds the batch
    /// assert_eq!(tree.approximate_sum(), 6);
    /// ```
    #[inline]
    pub fn approximate_sum(&self) -> isize {
        self.items[self.geometry.root_index()].load()
    }

    /// Computes the exact total by reading every item once.
    ///
    /// Every unit of delta lives in exactly one item at any instant (a flush
    /// atomically moves value from child to parent), so once all `add` calls
    /// have completed the sum is exact. The cost is proportional to
    /// [`item_count`](Self::item_count).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(4);
    /// let tree = CounterTree::with_shards(&items, 32, 4).unwrap();
    /// for shard in 0..4 {
    ///     tree.add_to_shard(shard, 10);
    /// }
    /// assert_eq!(tree.precise_sum(), 40);
    /// assert_eq!(tree.approximate_sum(), 0);
    /// ```
    pub fn precise_sum(&self) -> isize {
        self.items
            .iter()
            .fold(0isize, |acc, item| acc.wrapping_add(item.load()))
    }

    /// Returns the proven bounds on the approximate sum's error.
    ///
    /// Every non-root item buffers at most `batch_size` magnitude once all
    /// in-flight adds have returned, so both sides of the range are
    /// `(item_count - 1) * batch_size`. The value is precomputed at
    /// construction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(8); // 8 leaves + 2 + 1 = 11 items
    /// let tree = CounterTree::with_shards(&items, 4, 8).unwrap();
    /// let range = tree.approximate_accuracy_range();
    /// assert_eq!((range.under, range.over), (40, 40));
    /// ```
    #[inline]
    pub fn approximate_accuracy_range(&self) -> AccuracyRange {
        AccuracyRange {
            under: self.inaccuracy,
            over: self.inaccuracy,
        }
    }

    /// Three-way comparison of the estimated total against `value`, sound
    /// with respect to the accuracy range.
    ///
    /// A strict `Less`/`Greater` is returned only when the whole provable
    /// `[min, max]` interval lies on that side of `value`; whenever the
    /// interval straddles `value`, the comparison reports `Equal` rather
    /// than guessing. A strict answer is therefore always true of the exact
    /// total as well.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    ///
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(1); // single-shard trees are exact
    /// let tree = CounterTree::with_shards(&items, 32, 1).unwrap();
    /// tree.add(10);
    /// assert_eq!(tree.approximate_compare_value(3), Ordering::Greater);
    /// assert_eq!(tree.approximate_compare_value(10), Ordering::Equal);
    /// assert_eq!(tree.approximate_compare_value(99), Ordering::Less);
    /// ```
    pub fn approximate_compare_value(&self, value: isize) -> Ordering {
        let (min, max) = self.approximate_interval();
        if max < value {
            Ordering::Less
        } else if min > value {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Three-way comparison of the exact total against `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    ///
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items = items_buffer(4);
    /// let tree = CounterTree::with_shards(&items, 32, 4).unwrap();
    /// tree.add_to_shard(2, 7); // buffered, invisible to the root
    /// assert_eq!(tree.precise_compare_value(7), Ordering::Equal);
    /// assert_eq!(tree.precise_compare_value(6), Ordering::Greater);
    /// ```
    #[inline]
    pub fn precise_compare_value(&self, value: isize) -> Ordering {
        self.precise_sum().cmp(&value)
    }

    /// Three-way comparison of two trees' estimated totals, sound under the
    /// combined accuracy ranges of both.
    ///
    /// Returns a strict ordering only when the trees' `[min, max]` intervals
    /// are disjoint; overlapping intervals compare `Equal`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    ///
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items_a = items_buffer(1);
    /// let items_b = items_buffer(1);
    /// let a = CounterTree::with_shards(&items_a, 8, 1).unwrap();
    /// let b = CounterTree::with_shards(&items_b, 8, 1).unwrap();
    /// a.add(5);
    /// b.add(9);
    /// assert_eq!(a.approximate_compare(&b), Ordering::Less);
    /// ```
    pub fn approximate_compare(&self, other: &CounterTree<'_>) -> Ordering {
        let (min_a, max_a) = self.approximate_interval();
        let (min_b, max_b) = other.approximate_interval();
        if max_a < min_b {
            Ordering::Less
        } else if min_a > max_b {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Three-way comparison of two trees' exact totals.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    ///
    /// use alberi::tree::counter::CounterTree;
    /// use alberi::tree::items_buffer;
    ///
    /// let items_a = items_buffer(2);
    /// let items_b = items_buffer(2);
    /// let a = CounterTree::with_shards(&items_a, 32, 2).unwrap();
    /// let b = CounterTree::with_shards(&items_b, 32, 2).unwrap();
    /// a.add(5);
    /// b.add(9);
    /// assert_eq!(a.precise_compare(&b), Ordering::Less);
    /// assert_eq!(a.approximate_compare(&b), Ordering::Equal); // intervals overlap
    /// ```
    #[inline]
    pub fn precise_compare(&self, other: &CounterTree<'_>) -> Ordering {
        self.precise_sum().cmp(&other.precise_sum())
    }

    /// One approximate read widened by the accuracy range.
    fn approximate_interval(&self) -> (isize, isize) {
        self.approximate_accuracy_range()
            .min_max(self.approximate_sum())
    }

    #[inline]
    fn item(&self, level: usize, index: usize) -> &LevelItem {
        &self.items[self.geometry.flat_index(level, index)]
    }
}

impl Debug for CounterTree<'_> {
    /// Formats the tree showing non-zero items as `[level.index]:value`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.name)?;
        for level in 0..self.geometry.level_count() {
            for index in 0..self.geometry.level_len(level) {
                let value = self.item(level, index).load();
                if value != 0 {
                    write!(f, " [{level}.{index}]:{value}")?;
                }
            }
        }
        write!(f, " }}")
    }
}
