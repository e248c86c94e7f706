// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

// Reorder benchmark - random subtree moves in a flat list

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ordered_views::{IndexedStore, PositionReorderEngine, Positioned};

struct Row {
    position: Cell<usize>,
    children: usize,
}

impl Positioned for Row {
    fn position(&self) -> usize {
        return self.position.get();
    }

    fn set_position(&self, position: usize) {
        self.position.set(position);
    }

    fn subtree_size(&self) -> usize {
        return self.children;
    }
}

fn bench_random_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder_moves");
    let moves = 200;

    for size in [1000, 10000] {
        group.throughput(Throughput::Elements(moves as u64));
        group.bench_function(BenchmarkId::new("single_rows", size), |b| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(11);
                let rows = (0..size).map(|i| Rc::new(Row { position: Cell::new(i), children: 0 }));
                let mut store = IndexedStore::with_items(rows).unwrap();
                let mut engine = PositionReorderEngine::new(|_: &Rc<Row>| Ok::<(), Infallible>(()));

                for _ in 0..moves {
                    let from = rng.gen_range(0..size);
                    let mut to = rng.gen_range(0..size - 1);
                    if to >= from {
                        to += 1;
                    }
                    let Some(row) = store.get(from).cloned() else {
                        continue;
                    };
                    engine.move_item(&mut store, &row, to).unwrap();
                }
                black_box(store.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_random_moves);
criterion_main!(benches);
