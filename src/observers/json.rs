//! JSON observer for serializing counter trees.
//!
//! This module provides [`JsonObserver`], which serializes a collection of
//! [`CounterTree`]s to JSON format using serde. Every exported tree carries
//! its `[min, max]` interval, so downstream consumers can tell an exact
//! reading from a bounded estimate.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! alberi = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use alberi::observers::json::JsonObserver;
//!
//! let trees = vec![&requests, &errors];
//!
//! let observer = JsonObserver::new();
//! let json = observer.to_json(trees.into_iter()).unwrap();
//!
//! println!("{}", json);
//! // [{"name":"requests","value":960,"min":832,"max":1088},
//! //  {"name":"errors","value":0,"min":-128,"max":128}]
//! ```

use crate::snapshot::{ForestSnapshot, TreeSnapshot};
use crate::tree::counter::CounterTree;

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Whether to pretty-print the JSON output.
    pub pretty: bool,
    /// Whether to include a timestamp in the output.
    pub include_timestamp: bool,
    /// Whether to wrap trees in a [`ForestSnapshot`] object.
    pub wrap_in_snapshot: bool,
    /// Whether to capture precise sums instead of approximate ones.
    pub precise: bool,
}

/// An observer that serializes counter trees to JSON format.
///
/// # Examples
///
/// Basic usage (array of trees):
///
/// ```rust,ignore
/// use alberi::observers::json::JsonObserver;
///
/// let trees = vec![&tree];
/// let json = JsonObserver::new().to_json(trees.into_iter()).unwrap();
///
/// assert!(json.contains("min"));
/// assert!(json.contains("max"));
/// ```
///
/// Pretty-printed output:
///
/// ```rust,ignore
/// use alberi::observers::json::JsonObserver;
///
/// let observer = JsonObserver::new().pretty(true);
/// ```
///
/// With timestamp wrapper:
///
/// ```rust,ignore
/// use alberi::observers::json::JsonObserver;
///
/// let observer = JsonObserver::new()
///     .wrap_in_snapshot(true)
///     .include_timestamp(true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables timestamp inclusion.
    ///
    /// Only has effect when `wrap_in_snapshot` is also enabled.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Enables or disables wrapping the output in a [`ForestSnapshot`].
    pub fn wrap_in_snapshot(mut self, enabled: bool) -> Self {
        self.config.wrap_in_snapshot = enabled;
        self
    }

    /// Switches the capture to precise sums.
    ///
    /// Precise capture scans every item of every tree, so the exported
    /// intervals collapse to the exact values.
    pub fn precise(mut self, enabled: bool) -> Self {
        self.config.precise = enabled;
        self
    }

    /// Collects trees into a vector of [`TreeSnapshot`].
    ///
    /// This is useful when you need the intermediate representation
    /// before serialization.
    pub fn collect<'t, 'i: 't>(
        &self,
        trees: impl Iterator<Item = &'t CounterTree<'i>>,
    ) -> Vec<TreeSnapshot> {
        if self.config.precise {
            trees.map(TreeSnapshot::precise).collect()
        } else {
            trees.map(TreeSnapshot::approximate).collect()
        }
    }

    /// Serializes trees to a JSON string.
    ///
    /// # Arguments
    ///
    /// * `trees` - An iterator over references to [`CounterTree`]s
    ///
    /// # Returns
    ///
    /// A `Result` containing the JSON string or a serialization error.
    pub fn to_json<'t, 'i: 't>(
        &self,
        trees: impl Iterator<Item = &'t CounterTree<'i>>,
    ) -> Result<String, serde_json::Error> {
        let snapshots = self.collect(trees);

        if self.config.wrap_in_snapshot {
            let snapshot = if self.config.include_timestamp {
                ForestSnapshot::with_timestamp(snapshots, current_timestamp_ms())
            } else {
                ForestSnapshot::new(snapshots)
            };

            if self.config.pretty {
                serde_json::to_string_pretty(&snapshot)
            } else {
                serde_json::to_string(&snapshot)
            }
        } else if self.config.pretty {
            serde_json::to_string_pretty(&snapshots)
        } else {
            serde_json::to_string(&snapshots)
        }
    }

    /// Serializes trees to a JSON byte vector.
    pub fn to_json_bytes<'t, 'i: 't>(
        &self,
        trees: impl Iterator<Item = &'t CounterTree<'i>>,
    ) -> Result<Vec<u8>, serde_json::Error> {
        let snapshots = self.collect(trees);

        if self.config.wrap_in_snapshot {
            let snapshot = if self.config.include_timestamp {
                ForestSnapshot::with_timestamp(snapshots, current_timestamp_ms())
            } else {
                ForestSnapshot::new(snapshots)
            };
            serde_json::to_vec(&snapshot)
        } else {
            serde_json::to_vec(&snapshots)
        }
    }
}

/// Returns the current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::items_buffer;

    #[test]
    fn test_to_json_empty() {
        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![];
        let json = observer.to_json(trees.into_iter()).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_to_json_single_tree() {
        let items = items_buffer(1);
        let tree = CounterTree::with_shards(&items, 8, 1)
            .unwrap()
            .with_name("t");
        tree.add(5);

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = observer.to_json(trees.into_iter()).unwrap();

        // Single shard: the estimate is exact and the interval collapses
        assert_eq!(json, r#"[{"name":"t","value":5,"min":5,"max":5}]"#);
    }

    #[test]
    fn test_to_json_reports_interval() {
        let items = items_buffer(4);
        let tree = CounterTree::with_shards(&items, 8, 4)
            .unwrap()
            .with_name("buffered");
        tree.add_to_shard(0, 5); // stays in the leaf, estimate remains 0

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = observer.to_json(trees.into_iter()).unwrap();

        assert_eq!(
            json,
            r#"[{"name":"buffered","value":0,"min":-32,"max":32}]"#
        );
    }

    #[test]
    fn test_to_json_multiple_trees() {
        let items_a = items_buffer(2);
        let items_b = items_buffer(2);
        let requests = CounterTree::with_shards(&items_a, 4, 2)
            .unwrap()
            .with_name("requests");
        let errors = CounterTree::with_shards(&items_b, 4, 2)
            .unwrap()
            .with_name("errors");
        requests.add_to_shard(0, 1000);
        errors.add_to_shard(0, 5);

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&requests, &errors];
        let json = observer.to_json(trees.into_iter()).unwrap();

        assert!(json.contains("requests"));
        assert!(json.contains("1000"));
        assert!(json.contains("errors"));
        assert!(json.contains("5"));
    }

    #[test]
    fn test_to_json_negative_total() {
        let items = items_buffer(2);
        let balance = CounterTree::with_shards(&items, 4, 2)
            .unwrap()
            .with_name("balance");
        balance.add_to_shard(0, -100);

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&balance];
        let json = observer.to_json(trees.into_iter()).unwrap();

        assert!(json.contains("balance"));
        assert!(json.contains("-100"));
    }

    #[test]
    fn test_to_json_pretty() {
        let items = items_buffer(1);
        let tree = CounterTree::with_shards(&items, 4, 1)
            .unwrap()
            .with_name("test");
        tree.add(1);

        let observer = JsonObserver::new().pretty(true);
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = observer.to_json(trees.into_iter()).unwrap();

        // Pretty JSON contains newlines
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_with_snapshot() {
        let items = items_buffer(1);
        let tree = CounterTree::with_shards(&items, 4, 1)
            .unwrap()
            .with_name("metric");
        tree.add(100);

        let observer = JsonObserver::new().wrap_in_snapshot(true);
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = observer.to_json(trees.into_iter()).unwrap();

        assert!(json.contains("trees"));
        assert!(json.contains("metric"));
        assert!(json.contains("100"));
        assert!(!json.contains("timestamp_ms"));
    }

    #[test]
    fn test_to_json_with_timestamp() {
        let items = items_buffer(1);
        let tree = CounterTree::with_shards(&items, 4, 1)
            .unwrap()
            .with_name("metric");
        tree.add(50);

        let observer = JsonObserver::new()
            .wrap_in_snapshot(true)
            .include_timestamp(true);

        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = observer.to_json(trees.into_iter()).unwrap();

        assert!(json.contains("timestamp_ms"));
        assert!(json.contains("trees"));
    }

    #[test]
    fn test_to_json_precise() {
        let items = items_buffer(4);
        let tree = CounterTree::with_shards(&items, 8, 4)
            .unwrap()
            .with_name("t");
        tree.add_to_shard(0, 5); // buffered

        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = JsonObserver::new()
            .precise(true)
            .to_json(trees.into_iter())
            .unwrap();

        assert_eq!(json, r#"[{"name":"t","value":5,"min":5,"max":5}]"#);
    }

    #[test]
    fn test_collect() {
        let items = items_buffer(2);
        let tree = CounterTree::with_shards(&items, 4, 2)
            .unwrap()
            .with_name("collected");
        tree.add_to_shard(0, 25); // 25 > 4, flushes to the root

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let snapshots = observer.collect(trees.into_iter());

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].name, "collected");
        assert_eq!(snapshots[0].value, 25);
    }

    #[test]
    fn test_collect_precise() {
        let items = items_buffer(2);
        let tree = CounterTree::with_shards(&items, 64, 2)
            .unwrap()
            .with_name("exact");
        tree.add_to_shard(1, 25); // buffered

        let snapshots = JsonObserver::new()
            .precise(true)
            .collect(std::iter::once(&tree));

        assert_eq!(snapshots[0].value, 25);
        assert!(snapshots[0].is_exact());
    }

    #[test]
    fn test_unnamed_tree() {
        let items = items_buffer(1);
        let tree = CounterTree::with_shards(&items, 4, 1).unwrap();
        tree.add(99);

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let json = observer.to_json(trees.into_iter()).unwrap();

        assert!(json.contains("(unnamed)"));
    }

    #[test]
    fn test_wrapped_output_deserializes() {
        let items = items_buffer(2);
        let tree = CounterTree::with_shards(&items, 4, 2)
            .unwrap()
            .with_name("a");
        tree.add_to_shard(0, 10);

        let json = JsonObserver::new()
            .wrap_in_snapshot(true)
            .to_json(std::iter::once(&tree))
            .unwrap();

        let snapshot: ForestSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.trees.len(), 1);
        assert_eq!(snapshot.get("a").unwrap().value, 10);
    }

    #[test]
    fn test_to_json_bytes() {
        let items = items_buffer(1);
        let tree = CounterTree::with_shards(&items, 4, 1)
            .unwrap()
            .with_name("bytes_test");
        tree.add(123);

        let observer = JsonObserver::new();
        let trees: Vec<&CounterTree<'_>> = vec![&tree];
        let bytes = observer.to_json_bytes(trees.into_iter()).unwrap();

        let json = String::from_utf8(bytes).unwrap();
        assert!(json.contains("bytes_test"));
        assert!(json.contains("123"));
    }
}
