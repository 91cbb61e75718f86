//! Table observer for pretty-printing counter trees.
//!
//! This module provides [`TableObserver`], which renders a collection of
//! [`CounterTree`]s as a formatted ASCII table using the `tabled` crate.
//! Each row shows the O(1) estimate next to the interval the true total is
//! proven to lie in; an exact column can be enabled for callers willing to
//! pay for the full scan.
//!
//! # Feature Flag
//!
//! This module requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! alberi = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use alberi::observers::table::{TableObserver, TableStyle};
//!
//! let trees = vec![&requests, &errors];
//!
//! let observer = TableObserver::new().with_style(TableStyle::Rounded);
//! println!("{}", observer.render(trees.into_iter()));
//! // ╭──────────┬──────────┬──────────────╮
//! // │ Name     │ Estimate │ Range        │
//! // ├──────────┼──────────┼──────────────┤
//! // │ requests │ 960      │ [832, 1088]  │
//! // │ errors   │ 0        │ [-128, 128]  │
//! // ╰──────────┴──────────┴──────────────╯
//! ```

use crate::tree::counter::CounterTree;
use tabled::{builder::Builder, settings::Style, Table};

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// Extended ASCII characters
    Extended,
    /// GitHub-flavored Markdown table
    Markdown,
    /// ReStructuredText table
    ReStructuredText,
    /// Dots for borders
    Dots,
    /// No borders, just spacing
    Blank,
    /// Double-line borders
    Double,
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row.
    pub show_header: bool,
    /// Custom title for the table (optional).
    pub title: Option<String>,
    /// Whether to add an exact column (reads every item of every tree).
    pub precise: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
            precise: false,
        }
    }
}

/// An observer that renders counter trees as a formatted ASCII table.
///
/// The default output has three columns: the tree name, the approximate sum,
/// and the `[min, max]` interval reconstructed from the accuracy range. The
/// optional `Precise` column performs a full scan per tree, so leave it off
/// when rendering in a hot path.
///
/// # Examples
///
/// ```rust,ignore
/// use alberi::observers::table::TableObserver;
///
/// let trees = vec![&requests];
/// let output = TableObserver::new().precise(true).render(trees.into_iter());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    ///
    /// Default style is [`TableStyle::Rounded`] with the header shown and no
    /// exact column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use alberi::observers::table::{TableObserver, TableStyle};
    ///
    /// let observer = TableObserver::new().with_style(TableStyle::Ascii);
    /// ```
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets an optional title for the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// Enables or disables the exact column.
    ///
    /// When enabled every rendered tree is fully scanned, which costs one
    /// atomic load per item.
    pub fn precise(mut self, enabled: bool) -> Self {
        self.config.precise = enabled;
        self
    }

    /// Applies the configured style to a table.
    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Extended => {
                table.with(Style::extended());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::ReStructuredText => {
                table.with(Style::re_structured_text());
            }
            TableStyle::Dots => {
                table.with(Style::dots());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
            TableStyle::Double => {
                table.with(Style::ascii());
            } // Fallback
        }
    }

    /// Renders the trees as a formatted table string.
    ///
    /// # Arguments
    ///
    /// * `trees` - An iterator over references to [`CounterTree`]s
    ///
    /// # Returns
    ///
    /// A `String` containing the formatted table.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use alberi::observers::table::TableObserver;
    ///
    /// let trees = vec![&requests, &errors];
    ///
    /// // Estimate and range only
    /// let table = TableObserver::new().render(trees.iter().copied());
    ///
    /// // With the exact column
    /// let table = TableObserver::new()
    ///     .precise(true)
    ///     .render(trees.iter().copied());
    /// ```
    pub fn render<'t, 'i: 't>(&self, trees: impl Iterator<Item = &'t CounterTree<'i>>) -> String {
        let mut builder = Builder::default();

        if self.config.show_header {
            let mut header = vec!["Name".to_string(), "Estimate".to_string(), "Range".to_string()];
            if self.config.precise {
                header.push("Precise".to_string());
            }
            builder.push_record(header);
        }

        let mut rows = 0usize;
        for tree in trees {
            let estimate = tree.approximate_sum();
            let (min, max) = tree.approximate_accuracy_range().min_max(estimate);
            let name = if tree.name().is_empty() {
                "(unnamed)".to_string()
            } else {
                tree.name().to_string()
            };
            let mut row = vec![name, estimate.to_string(), format!("[{min}, {max}]")];
            if self.config.precise {
                row.push(tree.precise_sum().to_string());
            }
            builder.push_record(row);
            rows += 1;
        }

        if rows == 0 && !self.config.show_header {
            return String::new();
        }

        let mut table = builder.build();
        self.apply_style(&mut table);

        if let Some(ref title) = self.config.title {
            format!("{}\n{}", title, table)
        } else {
            table.to_string()
        }
    }
}
