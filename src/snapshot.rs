//! Snapshot types for serializing counter tree state.
//!
//! This module provides serializable snapshot types that capture a tree's
//! value together with the interval it is proven to lie in, so consumers of
//! exported metrics can see the accuracy alongside the number.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! alberi = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use alberi::snapshot::TreeSnapshot;
//!
//! let snapshot = TreeSnapshot::approximate(&tree);
//!
//! // Serialize with any serde-compatible format
//! let json = serde_json::to_string(&snapshot).unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::tree::counter::CounterTree;

/// A snapshot of a single tree's state.
///
/// `value` is the reading and `[min, max]` the interval the true total is
/// proven to lie in at capture time. Approximate snapshots widen the
/// interval by the tree's accuracy range; precise snapshots collapse it to
/// the value itself.
///
/// # Examples
///
/// ```rust,ignore
/// use alberi::snapshot::TreeSnapshot;
///
/// let snapshot = TreeSnapshot {
///     name: "requests".to_string(),
///     value: 42,
///     min: 10,
///     max: 74,
/// };
///
/// let json = serde_json::to_string(&snapshot).unwrap();
/// assert_eq!(json, r#"{"name":"requests","value":42,"min":10,"max":74}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeSnapshot {
    /// The name of the tree.
    pub name: String,
    /// The captured reading.
    pub value: isize,
    /// Lower bound on the true total at capture time.
    pub min: isize,
    /// Upper bound on the true total at capture time.
    pub max: isize,
}

impl TreeSnapshot {
    /// Creates a snapshot from raw parts.
    pub fn new(name: impl Into<String>, value: isize, min: isize, max: isize) -> Self {
        Self {
            name: name.into(),
            value,
            min,
            max,
        }
    }

    /// Captures a tree's approximate sum and its provable interval.
    pub fn approximate(tree: &CounterTree<'_>) -> Self {
        let value = tree.approximate_sum();
        let (min, max) = tree.approximate_accuracy_range().min_max(value);
        Self {
            name: Self::display_name(tree),
            value,
            min,
            max,
        }
    }

    /// Captures a tree's precise sum; the interval collapses to the value.
    pub fn precise(tree: &CounterTree<'_>) -> Self {
        let value = tree.precise_sum();
        Self {
            name: Self::display_name(tree),
            value,
            min: value,
            max: value,
        }
    }

    /// Returns `true` when the interval pins the total down exactly.
    pub fn is_exact(&self) -> bool {
        self.min == self.max
    }

    fn display_name(tree: &CounterTree<'_>) -> String {
        if tree.name().is_empty() {
            "(unnamed)".to_string()
        } else {
            tree.name().to_string()
        }
    }
}

/// A collection of tree snapshots, typically representing a point-in-time
/// capture of all metrics.
///
/// # Examples
///
/// ```rust,ignore
/// use alberi::snapshot::{ForestSnapshot, TreeSnapshot};
///
/// let snapshot = ForestSnapshot::new(vec![
///     TreeSnapshot::new("requests", 1000, 872, 1128),
///     TreeSnapshot::new("errors", 5, 5, 5),
/// ]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForestSnapshot {
    /// Optional timestamp in milliseconds since Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The tree snapshots.
    pub trees: Vec<TreeSnapshot>,
}

impl ForestSnapshot {
    /// Creates a new forest snapshot with the given trees.
    pub fn new(trees: Vec<TreeSnapshot>) -> Self {
        Self {
            timestamp_ms: None,
            trees,
        }
    }

    /// Creates a new forest snapshot with trees and a timestamp.
    pub fn with_timestamp(trees: Vec<TreeSnapshot>, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            trees,
        }
    }

    /// Finds a tree by name.
    pub fn get(&self, name: &str) -> Option<&TreeSnapshot> {
        self.trees.iter().find(|t| t.name == name)
    }

    /// Collects approximate snapshots from an iterator of trees.
    pub fn collect_approximate<'t, 'i: 't>(
        trees: impl Iterator<Item = &'t CounterTree<'i>>,
    ) -> Self {
        Self::new(trees.map(TreeSnapshot::approximate).collect())
    }

    /// Collects precise snapshots from an iterator of trees.
    pub fn collect_precise<'t, 'i: 't>(trees: impl Iterator<Item = &'t CounterTree<'i>>) -> Self {
        Self::new(trees.map(TreeSnapshot::precise).collect())
    }

    /// Collects approximate snapshots with a timestamp.
    pub fn collect_with_timestamp<'t, 'i: 't>(
        trees: impl Iterator<Item = &'t CounterTree<'i>>,
        timestamp_ms: u64,
    ) -> Self {
        Self::with_timestamp(trees.map(TreeSnapshot::approximate).collect(), timestamp_ms)
    }
}
