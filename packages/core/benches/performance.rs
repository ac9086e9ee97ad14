//! Performance benchmarks for nested-set operations
//!
//! Run with: `cargo bench -p nestedset-core`
//!
//! These benchmarks measure the critical paths:
//! - Appending new roots (max aggregate plus insert in one transaction)
//! - Moving a subtree across a populated forest (one bulk renumbering)
//! - Pure move arithmetic
//! - Subtree scans on libsql

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nestedset_core::config::TreeConfig;
use nestedset_core::db::{LibsqlTreeStore, MemoryTreeStore};
use nestedset_core::models::{Bounds, Node, NodeScope};
use nestedset_core::services::NestedSet;
use nestedset_core::tree::{plan_move, MovePosition};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Forest of `roots` trees, each a root with `fanout` children
async fn populate(tree: &NestedSet, roots: usize, fanout: usize) -> Vec<Node> {
    let mut created = Vec::new();
    for _ in 0..roots {
        let mut root = tree.create(Node::new()).await.unwrap();
        for _ in 0..fanout {
            let mut child = tree.create(Node::new()).await.unwrap();
            tree.move_to_child_of(&mut child, &mut root).await.unwrap();
        }
        created.push(tree.reload(&root).await.unwrap());
    }
    created
}

fn memory_tree() -> NestedSet {
    NestedSet::new(Arc::new(MemoryTreeStore::default()))
}

/// Benchmark root creation
fn bench_create(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("create_root_memory", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let tree = memory_tree();

                let start = std::time::Instant::now();
                for _ in 0..iters {
                    black_box(tree.create(Node::new()).await.unwrap());
                }
                start.elapsed()
            })
        });
    });
}

/// Benchmark moving the first tree behind the last one and back
///
/// Every iteration renumbers nearly the whole table.
fn bench_move(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("move_subtree");

    for size in [10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let tree = memory_tree();
                    let roots = populate(&tree, size, 3).await;
                    let mut first = roots[0].clone();
                    let mut last = roots[roots.len() - 1].clone();

                    let start = std::time::Instant::now();
                    for i in 0..iters {
                        let position = if i % 2 == 0 {
                            MovePosition::Right
                        } else {
                            MovePosition::Left
                        };
                        tree.move_to(&mut first, &mut last, position).await.unwrap();
                    }
                    start.elapsed()
                })
            });
        });
    }

    group.finish();
}

/// Benchmark the pure boundary arithmetic
fn bench_plan(c: &mut Criterion) {
    let source = NodeScope {
        id: 1,
        parent_id: None,
        bounds: Bounds::new(1, 400),
    };
    let target = NodeScope {
        id: 2,
        parent_id: Some(7),
        bounds: Bounds::new(1001, 1200),
    };

    c.bench_function("plan_move", |b| {
        b.iter(|| {
            let plan = plan_move(black_box(&source), black_box(&target), MovePosition::Child);
            black_box(plan.unwrap().bulk_update())
        })
    });
}

/// Benchmark subtree scans against a libsql file database
fn bench_libsql_scan(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("libsql");
    group.sample_size(10); // Fewer samples for I/O bound operations

    let temp_dir = TempDir::new().unwrap();
    let (tree, roots) = rt.block_on(async {
        let store = LibsqlTreeStore::new(temp_dir.path().join("bench.db"), TreeConfig::default())
            .await
            .unwrap();
        let tree = NestedSet::new(Arc::new(store));
        let roots = populate(&tree, 50, 4).await;
        (tree, roots)
    });

    group.bench_function("full_set", |b| {
        b.iter(|| rt.block_on(async { black_box(tree.full_set(&roots[25]).await.unwrap()) }))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_create,
    bench_move,
    bench_plan,
    bench_libsql_scan
);
criterion_main!(benches);
