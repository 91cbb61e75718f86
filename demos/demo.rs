//! Demo application showcasing counter trees and their serialization formats.
//!
//! Run with:
//! ```bash
//! cargo run --example demo --features demo -- --help
//! ```

use alberi::observers::json::JsonObserver;
use alberi::observers::table::{TableObserver, TableStyle};
use alberi::tree::counter::CounterTree;
use alberi::tree::item::LevelItem;
use alberi::tree::{default_shards, items_buffer};
use clap::{Parser, ValueEnum};
use std::thread;
use std::time::Duration;

/// Output format for tree serialization.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty ASCII table with estimate and proven range
    Table,
    /// JSON format
    Json,
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Markdown,
    Dots,
    Blank,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Markdown => TableStyle::Markdown,
            StyleChoice::Dots => TableStyle::Dots,
            StyleChoice::Blank => TableStyle::Blank,
        }
    }
}

/// Demo application for alberi - hierarchical sharded counters.
///
/// This demo creates sample counter trees, optionally simulates concurrent
/// updates, and serializes them in various formats so the gap between the
/// O(1) estimate and the exact total is visible.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Table style (for table format)
    #[arg(short, long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Flush threshold per item; larger values buffer more per shard
    #[arg(short, long, default_value = "64")]
    batch_size: usize,

    /// Leaf shards per tree (defaults to the available parallelism)
    #[arg(long)]
    shards: Option<usize>,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include timestamp in JSON output
    #[arg(long)]
    timestamp: bool,

    /// Show exact sums next to the estimates (scans every item)
    #[arg(long)]
    precise: bool,

    /// Simulate concurrent updates with N threads
    #[arg(long)]
    simulate: Option<usize>,

    /// Number of iterations per thread in simulation
    #[arg(long, default_value = "10000")]
    iterations: usize,

    /// Add a title to the output (table format)
    #[arg(long)]
    title: Option<String>,

    /// Watch mode: refresh every N milliseconds
    #[arg(short, long)]
    watch: Option<u64>,

    /// Hide header in table mode
    #[arg(long)]
    no_header: bool,
}

/// Creates sample trees over the given buffers, seeded with initial values.
fn create_trees<'a>(
    requests_items: &'a [LevelItem],
    errors_items: &'a [LevelItem],
    connections_items: &'a [LevelItem],
    batch_size: usize,
    shards: usize,
) -> (CounterTree<'a>, CounterTree<'a>, CounterTree<'a>) {
    let requests = CounterTree::with_shards(requests_items, batch_size, shards)
        .expect("requests tree")
        .with_name("http_requests_total");
    let errors = CounterTree::with_shards(errors_items, batch_size, shards)
        .expect("errors tree")
        .with_name("http_errors_total");
    let connections = CounterTree::with_shards(connections_items, batch_size, shards)
        .expect("connections tree")
        .with_name("active_connections");

    // Initialize with some values
    requests.add(1000);
    errors.add(23);
    connections.add(42);

    (requests, errors, connections)
}

/// Simulates concurrent tree updates.
fn simulate_traffic(
    requests: &CounterTree<'_>,
    errors: &CounterTree<'_>,
    connections: &CounterTree<'_>,
    num_threads: usize,
    iterations: usize,
) {
    thread::scope(|s| {
        for i in 0..num_threads {
            s.spawn(move || {
                for j in 0..iterations {
                    requests.add(1);

                    // Simulate ~5% error rate
                    if (i * iterations + j) % 20 == 0 {
                        errors.add(1);
                    }

                    // Simulate connection churn
                    if j % 10 == 0 {
                        connections.add(1);
                    }
                    if j % 15 == 0 {
                        connections.sub(1);
                    }
                }
            });
        }
    });
}

/// Renders trees in the specified format.
fn render_output(args: &Args, trees: Vec<&CounterTree<'_>>) -> String {
    match args.format {
        OutputFormat::Table => {
            let mut observer = TableObserver::new()
                .with_style(args.style.into())
                .with_header(!args.no_header)
                .precise(args.precise);

            if let Some(ref title) = args.title {
                observer = observer.with_title(title.clone());
            }

            observer.render(trees.into_iter())
        }

        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .wrap_in_snapshot(args.timestamp)
            .include_timestamp(args.timestamp)
            .precise(args.precise)
            .to_json(trees.into_iter())
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

fn main() {
    let args = Args::parse();
    let shards = args.shards.unwrap_or_else(default_shards);

    // The caller owns the storage, one buffer per tree
    let requests_items = items_buffer(shards);
    let errors_items = items_buffer(shards);
    let connections_items = items_buffer(shards);

    let (requests, errors, connections) = create_trees(
        &requests_items,
        &errors_items,
        &connections_items,
        args.batch_size,
        shards,
    );

    // Run simulation if requested
    if let Some(num_threads) = args.simulate {
        eprintln!(
            "Simulating {} threads x {} iterations...",
            num_threads, args.iterations
        );
        simulate_traffic(&requests, &errors, &connections, num_threads, args.iterations);
        eprintln!("Simulation complete.\n");
    }

    // Watch mode or single output
    if let Some(interval_ms) = args.watch {
        loop {
            // Clear screen (ANSI escape code)
            print!("\x1B[2J\x1B[1;1H");

            let trees: Vec<&CounterTree<'_>> = vec![&requests, &errors, &connections];

            println!("{}", render_output(&args, trees));

            thread::sleep(Duration::from_millis(interval_ms));
        }
    } else {
        let trees: Vec<&CounterTree<'_>> = vec![&requests, &errors, &connections];

        println!("{}", render_output(&args, trees));
    }
}
