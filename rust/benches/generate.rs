use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use hybrid_id::{GeneratorConfig, HybridIdGenerator, is_valid};
use svix_ksuid::{Ksuid, KsuidLike};
use ulid::Ulid;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    let standard = HybridIdGenerator::new(GeneratorConfig::default().with_node("A1"))
        .expect("valid generator config");
    group.bench_function("hybrid_id/standard", |b| {
        b.iter(|| black_box(standard.generate(None)))
    });
    group.bench_function("hybrid_id/standard+prefix", |b| {
        b.iter(|| black_box(standard.generate(Some("usr"))))
    });

    let extended = HybridIdGenerator::new(
        GeneratorConfig::default()
            .with_profile("extended")
            .with_node("A1"),
    )
    .expect("valid generator config");
    group.bench_function("hybrid_id/extended", |b| {
        b.iter(|| black_box(extended.generate(None)))
    });

    group.bench_function("ulid", |b| b.iter(|| black_box(Ulid::new().to_string())));
    group.bench_function("ksuid", |b| {
        b.iter(|| black_box(Ksuid::new(None, None).to_string()))
    });
    group.bench_function("nanoid", |b| b.iter(|| black_box(nanoid::nanoid!())));
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let generator = HybridIdGenerator::default();
    let id = generator.generate(Some("ord")).expect("valid prefix");
    c.bench_function("validate/prefixed", |b| b.iter(|| black_box(is_valid(&id))));
}

criterion_group!(benches, bench_generate, bench_validate);
criterion_main!(benches);
