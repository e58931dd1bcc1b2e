use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use listwright_engine::lists::{build, flatten, renumber_document};
use listwright_engine::{Document, ListOptions};

/// A numbered outline `width` items wide and `depth` levels deep.
fn generate_outline(width: usize, depth: usize) -> String {
    fn level(out: &mut String, width: usize, depth: usize, indent: usize) {
        if depth == 0 {
            return;
        }
        for i in 0..width {
            out.push_str(&format!("{}1. Item {i} at depth {depth}\n", "   ".repeat(indent)));
            level(out, width, depth - 1, indent + 1);
        }
    }
    let mut out = String::new();
    level(&mut out, width, depth, 0);
    out
}

fn bench_flatten_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_model");
    group.sample_size(20);

    let options = ListOptions::default();
    let mut doc = Document::from_markdown(&generate_outline(8, 3));
    renumber_document(&mut doc, &options);
    let list = doc.children(doc.body())[0];

    group.bench_function("flatten", |b| {
        b.iter(|| {
            let array = flatten(&mut doc, black_box(list)).unwrap();
            black_box(array);
        });
    });

    let array = flatten(&mut doc, list).unwrap();
    group.bench_function("build", |b| {
        // Building allocates into the arena, so each run gets its own copy.
        b.iter_batched(
            || doc.clone(),
            |mut doc| {
                let built = build(&mut doc, black_box(&array), 0, None, &options).unwrap();
                black_box(built);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_renumber(c: &mut Criterion) {
    let mut group = c.benchmark_group("renumber");
    group.sample_size(20);

    let options = ListOptions::default();
    let markdown = generate_outline(10, 3);
    group.bench_function("renumber_document", |b| {
        b.iter(|| {
            let mut doc = Document::from_markdown(black_box(&markdown));
            black_box(renumber_document(&mut doc, &options));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_flatten_build, bench_renumber);
criterion_main!(benches);
