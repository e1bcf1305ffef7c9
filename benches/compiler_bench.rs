use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use pgac::*;

// Benchmark scenarios: structure constants, per-operator synthesis, the full
// table, emission, and artifact verification.

fn standard_table() -> synth::OperatorTable {
    synth::OperatorTable::synthesize(&registry::TypeRegistry::standard())
        .expect("standard registry must synthesize")
}

// Geometric product of two generic full multivectors (256 symbolic terms).
fn bench_generic_product(c: &mut Criterion) {
    let a = algebra::Multivector::generic(expr::Operand::Lhs, basis::Mask::FULL);
    let b = algebra::Multivector::generic(expr::Operand::Rhs, basis::Mask::FULL);
    c.bench_function("algebra/geometric_full_full", |bench| {
        bench.iter(|| black_box(black_box(&a).geometric(black_box(&b))));
    });
}

// Per-operator synthesis latency for representative operand pairs.
fn bench_synthesize_binary(c: &mut Criterion) {
    use registry::SubspaceType::*;
    use synth::BinaryOp;

    let registry = registry::TypeRegistry::standard();
    let mut group = c.benchmark_group("synth/binary");
    let cases = [
        ("add_vector_vector", BinaryOp::Add, Vector, Vector),
        ("mul_bivector_trivector", BinaryOp::Mul, Bivector, Trivector),
        ("vee_trivector_trivector", BinaryOp::Vee, Trivector, Trivector),
        ("mul_full_full", BinaryOp::Mul, FullMultivector, FullMultivector),
    ];
    for (name, op, lhs, rhs) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(op, lhs, rhs), |b, &(op, lhs, rhs)| {
            b.iter(|| black_box(synth::synthesize_binary(&registry, op, lhs, rhs)));
        });
    }
    group.finish();
}

// Sandwich products dominate derived synthesis.
fn bench_synthesize_derived(c: &mut Criterion) {
    use registry::SubspaceType::*;
    c.bench_function("synth/transform_full_full", |b| {
        b.iter(|| {
            black_box(synth::synthesize_derived(
                synth::DerivedOp::Transform,
                FullMultivector,
                FullMultivector,
            ))
        });
    });
}

// Full table: every operation over every registered type combination.
fn bench_full_table(c: &mut Criterion) {
    let registry = registry::TypeRegistry::standard();
    c.bench_function("synth/full_table", |b| {
        b.iter(|| black_box(synth::OperatorTable::synthesize(black_box(&registry))));
    });
}

// Emission and verification on a prebuilt table.
fn bench_emit_and_verify(c: &mut Criterion) {
    let table = standard_table();
    let options = codegen::CodegenOptions::default();

    c.bench_function("codegen/emit", |b| {
        b.iter(|| black_box(codegen::codegen(black_box(&table), &options)));
    });

    let source = codegen::codegen(&table, &options).source;
    let plan = codegen::planned_signatures(&table);
    c.bench_function("verify/artifact", |b| {
        b.iter(|| black_box(verify::verify(black_box(&source), &plan)));
    });
}

// End-to-end pipeline through the pass manager.
fn bench_pipeline(c: &mut Criterion) {
    c.bench_function("pipeline/verify_terminal", |b| {
        b.iter_batched(
            || {
                pipeline::CompilationState::new(
                    registry::TypeRegistry::standard(),
                    codegen::CodegenOptions::default(),
                )
            },
            |mut state| {
                let _ = pipeline::run_pipeline(&mut state, pass::PassId::Verify, false, |_, _| {});
                black_box(state.generated.map(|g| g.source.len()))
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_generic_product,
    bench_synthesize_binary,
    bench_synthesize_derived,
    bench_full_table,
    bench_emit_and_verify,
    bench_pipeline,
);
criterion_main!(benches);
