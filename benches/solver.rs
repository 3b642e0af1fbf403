//! Benchmarks for the polycube packing solver.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cubepack::grid::{canonical_key, format_solution};
use cubepack::pieces::{build_orientations, Preset};
use cubepack::solver::{SolveMode, Solver, SolverConfig};

/// Benchmark finding the first Soma packing.
fn bench_first_solution(c: &mut Criterion) {
    let catalog = Preset::Soma.catalog().unwrap();
    let solver = Solver::new(&catalog, Preset::Soma.dims(), SolverConfig::new()).unwrap();

    c.bench_function("soma_first_solution", |b| {
        b.iter(|| black_box(&solver).first_solution())
    });
}

/// Benchmark enumerating every Soma packing.
fn bench_all_solutions(c: &mut Criterion) {
    let catalog = Preset::Soma.catalog().unwrap();
    let config = SolverConfig::new().with_mode(SolveMode::AllSolutions);
    let solver = Solver::new(&catalog, Preset::Soma.dims(), config).unwrap();

    let mut group = c.benchmark_group("soma");
    group.sample_size(10);
    group.bench_function("all_solutions", |b| b.iter(|| black_box(&solver).solve()));
    group.bench_function("all_solutions_parallel", |b| {
        b.iter(|| black_box(&solver).solve_parallel())
    });
    group.finish();
}

/// Benchmark deriving the orientation set of a single piece.
fn bench_orientations(c: &mut Criterion) {
    let catalog = Preset::Standard.catalog().unwrap();
    let piece = catalog.piece(4).unwrap();

    c.bench_function("build_orientations", |b| {
        b.iter(|| build_orientations(black_box(piece)))
    });
}

/// Benchmark the rotation-invariant key of a solution.
fn bench_canonical_key(c: &mut Criterion) {
    let catalog = Preset::Soma.catalog().unwrap();
    let solver = Solver::new(&catalog, Preset::Soma.dims(), SolverConfig::new()).unwrap();
    let solution = solver.first_solution().unwrap();

    c.bench_function("canonical_key", |b| {
        b.iter(|| canonical_key(solver.target(), black_box(&solution)))
    });
}

/// Benchmark formatting a solution for display.
fn bench_format_solution(c: &mut Criterion) {
    let catalog = Preset::Soma.catalog().unwrap();
    let solver = Solver::new(&catalog, Preset::Soma.dims(), SolverConfig::new()).unwrap();
    let solution = solver.first_solution().unwrap();

    c.bench_function("format_solution", |b| {
        b.iter(|| format_solution(solver.target(), black_box(&solution)))
    });
}

criterion_group!(
    benches,
    bench_first_solution,
    bench_all_solutions,
    bench_orientations,
    bench_canonical_key,
    bench_format_solution
);
criterion_main!(benches);
