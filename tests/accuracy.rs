//! End-to-end accuracy checks driven by an external oracle.
//!
//! Every walk feeds two trees the same deltas while tracking the true total
//! on the side, then verifies the whole read surface: precise sums, the
//! approximate sum against its accuracy range, the reconstructed interval,
//! and the sound comparison operations.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicIsize, Ordering as AtomicOrdering};
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use alberi::tree::counter::{approximate_min_max_range, CounterTree};
use alberi::tree::item::LevelItem;
use alberi::tree::{items_buffer, items_size};

const SHARDS: usize = 8;

/// Checks every guarantee a tree makes about its total.
fn check_counter(tree: &CounterTree<'_>, expected: isize) {
    let approx = tree.approximate_sum();
    let range = tree.approximate_accuracy_range();

    assert_eq!(tree.precise_sum(), expected);
    assert_eq!(tree.precise_compare_value(expected), Ordering::Equal);
    assert_eq!(tree.approximate_compare_value(expected), Ordering::Equal);

    // The estimate sits within the accuracy range of the truth
    assert!(approx >= expected.saturating_sub_unsigned(range.under));
    assert!(approx <= expected.saturating_add_unsigned(range.over));

    // And the interval rebuilt from the estimate contains the truth
    let (min, max) = approximate_min_max_range(approx, range.under, range.over);
    assert!(min <= expected, "min {} above expected {}", min, expected);
    assert!(expected <= max, "expected {} above max {}", expected, max);

    // Off by one past either bound, the comparison turns strict
    assert_eq!(tree.approximate_compare_value(min - 1), Ordering::Greater);
    assert_eq!(tree.approximate_compare_value(max + 1), Ordering::Less);
}

/// Checks that two identically fed trees agree.
fn check_pair(a: &CounterTree<'_>, b: &CounterTree<'_>) {
    assert_eq!(a.precise_sum(), b.precise_sum());
    assert_eq!(a.precise_compare(b), Ordering::Equal);
    assert_eq!(a.approximate_compare(b), Ordering::Equal);
}

#[derive(Clone, Copy)]
enum Increment {
    One,
    MinusOne,
    Random,
}

/// Feeds two trees one delta at a time, checking invariants after every
/// step. Shard choice is parameterized so the walks cover pinned and
/// scattered writers.
fn run_sequential_walk(
    pick_a: impl Fn(&mut StdRng) -> usize,
    pick_b: impl Fn(&mut StdRng) -> usize,
    mode: Increment,
    seed: u64,
) {
    let items_a = items_buffer(SHARDS);
    let items_b = items_buffer(SHARDS);
    let a = CounterTree::with_shards(&items_a, 32, SHARDS).unwrap();
    let b = CounterTree::with_shards(&items_b, 32, SHARDS).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut expected_a = 0isize;
    let mut expected_b = 0isize;

    for _ in 0..10_000 {
        let delta = match mode {
            Increment::One => 1,
            Increment::MinusOne => -1,
            Increment::Random => rng.gen_range(-49_999..50_000),
        };
        a.add_to_shard(pick_a(&mut rng), delta);
        expected_a += delta;
        b.add_to_shard(pick_b(&mut rng), delta);
        expected_b += delta;

        check_counter(&a, expected_a);
        check_counter(&b, expected_b);
        check_pair(&a, &b);
    }
}

#[test]
fn sequential_walk_first_shard() {
    run_sequential_walk(|_| 0, |_| 0, Increment::One, 1);
    run_sequential_walk(|_| 0, |_| 0, Increment::MinusOne, 2);
    run_sequential_walk(|_| 0, |_| 0, Increment::Random, 3);
}

#[test]
fn sequential_walk_mixed_shards() {
    run_sequential_walk(|_| 0, |rng| rng.gen_range(0..SHARDS), Increment::One, 4);
    run_sequential_walk(|_| 0, |rng| rng.gen_range(0..SHARDS), Increment::MinusOne, 5);
    run_sequential_walk(|_| 0, |rng| rng.gen_range(0..SHARDS), Increment::Random, 6);
}

#[test]
fn sequential_walk_random_shards() {
    let scatter = |rng: &mut StdRng| rng.gen_range(0..SHARDS);
    run_sequential_walk(scatter, scatter, Increment::One, 7);
    run_sequential_walk(scatter, scatter, Increment::MinusOne, 8);
    run_sequential_walk(scatter, scatter, Increment::Random, 9);
}

/// Spawns one writer per shard of tree A; tree B's writer placement is
/// parameterized the same way the oracle harness varies CPU placement.
fn run_concurrent(
    batch_size: usize,
    nr_inc: usize,
    increment: isize,
    place_b: impl Fn(usize, &mut StdRng) -> usize,
    seed: u64,
) {
    let items_a = items_buffer(SHARDS);
    let items_b = items_buffer(SHARDS);
    let a = CounterTree::with_shards(&items_a, batch_size, SHARDS).unwrap();
    let b = CounterTree::with_shards(&items_b, batch_size, SHARDS).unwrap();
    let oracle_a = AtomicIsize::new(0);
    let oracle_b = AtomicIsize::new(0);

    let mut rng = StdRng::seed_from_u64(seed);
    let placements: Vec<(usize, usize)> = (0..SHARDS)
        .map(|shard| (shard, place_b(shard, &mut rng)))
        .collect();

    thread::scope(|s| {
        for &(shard_a, shard_b) in &placements {
            let (a, b) = (&a, &b);
            let (oracle_a, oracle_b) = (&oracle_a, &oracle_b);
            s.spawn(move || {
                for _ in 0..nr_inc {
                    a.add_to_shard(shard_a, increment);
                    oracle_a.fetch_add(increment, AtomicOrdering::Relaxed);
                    b.add_to_shard(shard_b, increment);
                    oracle_b.fetch_add(increment, AtomicOrdering::Relaxed);
                }
            });
        }
    });

    check_counter(&a, oracle_a.load(AtomicOrdering::Relaxed));
    check_counter(&b, oracle_b.load(AtomicOrdering::Relaxed));
    check_pair(&a, &b);
}

#[test]
fn concurrent_batch_matrix() {
    let mut seed = 100u64;
    for batch_size in [4usize, 32, 256] {
        for nr_inc in [1usize, 64, 512] {
            for increment in [1isize, 7, 4096, -3] {
                // Writers on their own shard, paired, piled up, scattered
                run_concurrent(batch_size, nr_inc, increment, |shard, _| shard, seed);
                run_concurrent(batch_size, nr_inc, increment, |shard, _| shard & !1, seed + 1);
                run_concurrent(batch_size, nr_inc, increment, |_, _| 0, seed + 2);
                run_concurrent(
                    batch_size,
                    nr_inc,
                    increment,
                    |_, rng| rng.gen_range(0..SHARDS),
                    seed + 3,
                );
                seed += 4;
            }
        }
    }
}

#[test]
fn concurrent_random_walk() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..10 {
        let items_a = items_buffer(SHARDS);
        let items_b = items_buffer(SHARDS);
        let a = CounterTree::with_shards(&items_a, 32, SHARDS).unwrap();
        let b = CounterTree::with_shards(&items_b, 32, SHARDS).unwrap();
        let oracle_a = AtomicIsize::new(0);
        let oracle_b = AtomicIsize::new(0);

        let jobs: Vec<(usize, usize, isize)> = (0..200)
            .map(|_| {
                (
                    rng.gen_range(0..SHARDS),
                    rng.gen_range(0..1024),
                    rng.gen_range(-511..512),
                )
            })
            .collect();

        thread::scope(|s| {
            for worker in 0..SHARDS {
                let (a, b) = (&a, &b);
                let (oracle_a, oracle_b) = (&oracle_a, &oracle_b);
                let jobs = &jobs;
                s.spawn(move || {
                    for &(shard, nr, delta) in jobs.iter().skip(worker).step_by(SHARDS) {
                        for _ in 0..nr {
                            a.add_to_shard(shard, delta);
                            oracle_a.fetch_add(delta, AtomicOrdering::Relaxed);
                            b.add_to_shard(shard, delta);
                            oracle_b.fetch_add(delta, AtomicOrdering::Relaxed);
                        }
                    }
                });
            }
        });

        check_counter(&a, oracle_a.load(AtomicOrdering::Relaxed));
        check_counter(&b, oracle_b.load(AtomicOrdering::Relaxed));
        check_pair(&a, &b);
    }
}

#[test]
fn single_writer_estimate_stays_within_one_batch() {
    // A lone writer strands residue only in its own leaf, so the estimate
    // tracks the truth within one batch even though the tree-wide bound is
    // far looser.
    let items = items_buffer(SHARDS);
    let tree = CounterTree::with_shards(&items, 32, SHARDS).unwrap();

    for _ in 0..10_000 {
        tree.add_to_shard(0, 1);
    }

    assert_eq!(tree.precise_sum(), 10_000);
    let approx = tree.approximate_sum();
    assert!(approx >= 10_000 - 32);
    assert!(approx <= 10_000);
    check_counter(&tree, 10_000);
}

#[test]
fn two_writers_of_negative_units() {
    let items = items_buffer(2);
    let tree = CounterTree::with_shards(&items, 32, 2).unwrap();

    thread::scope(|s| {
        for shard in 0..2 {
            let tree = &tree;
            s.spawn(move || {
                for _ in 0..10_000 {
                    tree.add_to_shard(shard, -1);
                }
            });
        }
    });

    assert_eq!(tree.precise_sum(), -20_000);
    check_counter(&tree, -20_000);
}

#[test]
fn oversized_delta_cascades_to_the_root() {
    // Four levels deep; a delta above the batch size must not strand at any
    // intermediate level.
    let items = items_buffer(64);
    let tree = CounterTree::with_shards(&items, 4, 64).unwrap();

    tree.add_to_shard(17, 5);

    assert_eq!(tree.approximate_sum(), 5);
    assert_eq!(tree.precise_sum(), 5);
    check_counter(&tree, 5);
}

#[test]
fn caller_allocates_exact_buffer() {
    let items: Vec<LevelItem> = std::iter::repeat_with(LevelItem::new)
        .take(items_size(5))
        .collect();
    let tree = CounterTree::with_shards(&items, 16, 5).unwrap();

    tree.add_to_shard(4, 3);
    assert_eq!(tree.precise_sum(), 3);
    check_counter(&tree, 3);
}
