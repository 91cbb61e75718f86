//! Error types for counter tree construction.
//!
//! Construction is the only fallible surface of this crate: once a
//! [`CounterTree`](crate::tree::counter::CounterTree) exists, every update
//! and read on it is a total function. All variants here are returned
//! synchronously by the constructors and are never raised mid-operation.

use thiserror::Error;

/// Errors that can occur while building a counter tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The requested shard count was zero. A tree needs at least one leaf.
    #[error("shard count must be at least 1")]
    NoShards,

    /// The batch size does not fit in a signed machine word, so the flush
    /// threshold could never be crossed.
    #[error("batch size {0} exceeds the signed machine-word range")]
    BatchSizeTooLarge(usize),

    /// The caller-supplied item buffer is smaller than the geometry derived
    /// from the shard count requires.
    #[error("item buffer holds {got} items, but {shards} shards need {needed}")]
    ItemsTooSmall {
        /// Requested number of leaf shards.
        shards: usize,
        /// Items required by the derived geometry.
        needed: usize,
        /// Items actually supplied.
        got: usize,
    },

    /// The accuracy bound `(items - 1) * batch_size` is not representable,
    /// which would make the approximate read modes meaningless.
    #[error("accuracy bound overflows with {items} items and batch size {batch_size}")]
    AccuracyOverflow {
        /// Total items in the derived geometry.
        items: usize,
        /// Requested batch size.
        batch_size: usize,
    },
}

/// Convenience alias for results produced by tree construction.
pub type Result<T> = std::result::Result<T, TreeError>;
