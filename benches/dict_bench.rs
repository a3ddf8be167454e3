use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use postdex::dict::{DictReader, DictWriter, ScanControl};
use tempfile::tempdir;

fn build_dict(dir: &std::path::Path, count: u32) -> std::path::PathBuf {
    let path = dir.join("bench.dict");
    let mut w = DictWriter::create(&path, 16).unwrap();
    for i in 0..count {
        let key = format!("term{:08}", i);
        w.add(key.as_bytes(), &i.to_be_bytes()).unwrap();
    }
    w.close().unwrap();
    path
}

fn bench_get(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut group = c.benchmark_group("dict_get");

    for count in [1_000u32, 10_000, 100_000] {
        let path = build_dict(dir.path(), count);
        let reader = DictReader::open(&path).unwrap();
        let probe = format!("term{:08}", count / 2);

        group.bench_with_input(BenchmarkId::from_parameter(count), &probe, |b, probe| {
            b.iter(|| reader.get(black_box(probe.as_bytes())).unwrap());
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = build_dict(dir.path(), 50_000);
    let reader = DictReader::open(&path).unwrap();

    c.bench_function("dict_scan_full", |b| {
        b.iter(|| {
            let mut count = 0usize;
            reader
                .scan(b"", |_, _| {
                    count += 1;
                    ScanControl::Continue
                })
                .unwrap();
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_get, bench_scan);
criterion_main!(benches);
