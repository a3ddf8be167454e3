use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use postdex::posting::{and, codec, or, DocId, Mode, Position, Posting, PostingList, TermType};

fn dense_list(doc_count: u32, step: u32) -> PostingList {
    let postings: Vec<Posting> = (0..doc_count)
        .step_by(step as usize)
        .map(|doc| Posting {
            doc_id: DocId::new(doc + 1),
            position: Position::new(1),
            weight: 1.0,
        })
        .collect();
    PostingList::from_sorted(postings, TermType(0), true)
}

fn bench_merge_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("posting_merge");

    for size in [1_000u32, 100_000] {
        let a = dense_list(size, 2);
        let b = dense_list(size, 3);

        group.bench_with_input(BenchmarkId::new("or", size), &(a.clone(), b.clone()), |bch, (a, b)| {
            bch.iter(|| or(black_box(a), black_box(b), Mode::Strict));
        });

        group.bench_with_input(BenchmarkId::new("and", size), &(a, b), |bch, (a, b)| {
            bch.iter(|| and(black_box(a), black_box(b), Mode::Strict));
        });
    }

    group.finish();
}

fn bench_codec_roundtrip(c: &mut Criterion) {
    let list = dense_list(200_000, 1);

    c.bench_function("posting_codec_encode", |b| {
        b.iter(|| codec::encode(black_box(&list)));
    });

    let encoded = codec::encode(&list);
    c.bench_function("posting_codec_decode", |b| {
        b.iter(|| codec::decode(black_box(&encoded)).unwrap());
    });
}

criterion_group!(benches, bench_merge_operators, bench_codec_roundtrip);
criterion_main!(benches);
