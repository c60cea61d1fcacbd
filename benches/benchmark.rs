// Throughput of the join, grouping and index stages
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tabvec::prelude::*;

const CATEGORIES: [&str; 8] = [
    "Electronics", "Books", "Clothing", "Garden", "Toys", "Sports", "Music", "Food",
];

fn base_table(rows: usize) -> Table {
    Table::from_rows(
        ["id", "category"],
        (0..rows)
            .map(|i| vec![(i as i64).into(), CATEGORIES[i % CATEGORIES.len()].into()])
            .collect(),
    )
    .unwrap()
}

fn product_table(rows: usize) -> Table {
    Table::from_rows(
        ["id", "product", "price"],
        (0..rows * 2)
            .map(|i| {
                vec![
                    ((i / 2) as i64).into(),
                    format!("product number {}", i).into(),
                    (i as f64 * 0.25).into(),
                ]
            })
            .collect(),
    )
    .unwrap()
}

fn description_table(rows: usize) -> Table {
    Table::from_rows(
        ["id", "description"],
        (0..rows)
            .map(|i| vec![(i as i64).into(), format!("description of item {}", i).into()])
            .collect(),
    )
    .unwrap()
}

fn sources(rows: usize) -> Vec<Table> {
    vec![base_table(rows), product_table(rows), description_table(rows)]
}

fn benchmark_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");
    let key = JoinKey::single("id");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("three_tables", size), size, |b, &size| {
            let tables = sources(size);
            b.iter(|| {
                let unified = join(black_box(tables.clone()), &key, &JoinOptions::default());
                black_box(unified.unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_group_and_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_and_assemble");

    for size in [100, 1000, 10000].iter() {
        let unified = join(sources(*size), &JoinKey::single("id"), &JoinOptions::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("first_seen", size), &unified, |b, unified| {
            b.iter(|| {
                let documents =
                    group_and_assemble(black_box(unified), "category", &AssemblyOptions::default());
                black_box(documents.unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    let unified = join(sources(1000), &JoinKey::single("id"), &JoinOptions::default()).unwrap();
    let documents = group_and_assemble(&unified, "category", &AssemblyOptions::default()).unwrap();
    let embedder = HashingEmbedder::default();

    group.bench_function("build", |b| {
        b.iter(|| {
            let index = IndexBuilder::new(&embedder).build(black_box(documents.clone()));
            black_box(index.unwrap());
        });
    });

    let index = IndexBuilder::new(&embedder).build(documents).unwrap();
    let service = QueryService::new(&embedder, &index).unwrap();

    group.bench_function("search", |b| {
        b.iter(|| {
            let results = service.search(black_box("electronics product"), 3);
            black_box(results.unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_join, benchmark_group_and_assemble, benchmark_index);
criterion_main!(benches);
