use common::tokenizer::tokenize;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_tokenize(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog -- 42 times, \
                across http://example.com/pages and back again. "
        .repeat(64);
    c.bench_function("tokenize_page_text", |b| b.iter(|| tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
