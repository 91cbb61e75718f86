//! Observer implementations for collecting and exporting tree metrics.
//!
//! This module provides various ways to observe and export counter trees:
//!
//! - [`table`] - Pretty-print trees as tables using the `tabled` crate
//! - [`json`] - Serialize trees to JSON format
//!
//! Observers capture approximate readings by default, annotated with the
//! `[min, max]` interval the true total is proven to lie in; each observer
//! has a `precise` switch for callers that want exact values and can afford
//! the full scan.
//!
//! # Feature Flags
//!
//! Each observer is gated behind a feature flag to minimize dependencies:
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `full` - Enables all observer modules
//!
//! # Example
//!
//! ```rust,ignore
//! use alberi::tree::counter::CounterTree;
//!
//! fn export_metrics(trees: &[&CounterTree<'_>]) {
//!     #[cfg(feature = "table")]
//!     {
//!         use alberi::observers::table::TableObserver;
//!         let observer = TableObserver::new();
//!         println!("{}", observer.render(trees.iter().copied()));
//!     }
//!
//!     #[cfg(feature = "json")]
//!     {
//!         use alberi::observers::json::JsonObserver;
//!         let observer = JsonObserver::new();
//!         println!("{}", observer.to_json(trees.iter().copied()).unwrap());
//!     }
//! }
//! ```

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
