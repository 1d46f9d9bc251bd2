use criterion::{criterion_group, criterion_main, Criterion};
use ftse_core::tokenizer::tokenize;
use ftse_core::IndexBuilder;

fn bench_tokenize(c: &mut Criterion) {
    let line = "The Golem network: a decentralized marketplace for computing power, v0.12 — naïve café.\n";
    c.bench_function("tokenize_line", |b| b.iter(|| tokenize(line).count()));
}

fn bench_search(c: &mut Criterion) {
    let mut builder = IndexBuilder::new();
    for i in 0..10_000u32 {
        builder.add_line(&format!("file{}.txt", i % 20), i / 20, format!("line {i} golem network node{}\n", i % 97));
    }
    let index = builder.finish();
    c.bench_function("query_golem_or_node5", |b| b.iter(|| index.query("golem OR node5").unwrap()));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
