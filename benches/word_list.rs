use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use wordbook_rs::{merge_words, page_slice};

fn synthetic_corpus(len: usize) -> Vec<String> {
    (0..len).map(|i| format!("word{i:06}")).collect()
}

fn bench_merge(c: &mut Criterion) {
    let corpus = synthetic_corpus(370_000);
    // Half of the user words already exist in the corpus.
    let user: Vec<String> = (0..2_000)
        .map(|i| {
            if i % 2 == 0 {
                format!("word{i:06}")
            } else {
                format!("custom{i}")
            }
        })
        .collect();
    c.bench_function("merge_words::corpus_370k", |b| {
        b.iter(|| {
            let merged = merge_words(black_box(&corpus), black_box(&user));
            black_box(merged.len());
        });
    });
}

fn bench_pages(c: &mut Criterion) {
    let words = synthetic_corpus(370_000);
    for &page in &[0usize, 3_700, 7_399, 10_000] {
        c.bench_with_input(BenchmarkId::new("page_slice", page), &page, |b, &page| {
            b.iter(|| black_box(page_slice(&words, page, 50).len()));
        });
    }
}

criterion_group!(benches, bench_merge, bench_pages);
criterion_main!(benches);
