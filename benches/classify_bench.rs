/// Benchmarks for the glint instrumentation pipeline.
///
/// Run with: `cargo bench`
///
/// Covers the hot paths: range classification at various set sizes, the
/// uncovered-set builder, and the per-file parse/rewrite/print cycle over
/// synthetic Go sources.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::fmt::Write as _;

use glint::domain::position::{CodeRange, SourcePos};
use glint::domain::ranges::{CoverageBlock, UncoveredRanges};
use glint::domain::rewrite::Rewriter;
use glint::infrastructure::parser::parse_file;
use glint::infrastructure::printer::print_file;

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// Coverage blocks spaced ten lines apart; every other block uncovered.
fn synthetic_blocks(count: usize) -> Vec<CoverageBlock> {
    (0..count)
        .map(|i| {
            let line = (i * 10 + 1) as u32;
            CoverageBlock {
                range: CodeRange::new(SourcePos::new(line, 2), SourcePos::new(line + 5, 2)),
                hits: (i % 2) as u64,
            }
        })
        .collect()
}

/// Queries probing contained, overlapping and covered territory.
fn synthetic_queries(count: usize, span_lines: u32) -> Vec<CodeRange> {
    (0..count)
        .map(|i| {
            let line = ((i * 7) as u32 % span_lines) + 1;
            CodeRange::new(SourcePos::new(line, 3), SourcePos::new(line + 2, 9))
        })
        .collect()
}

/// A Go file with `funcs` small functions, each carrying a loop and a branch.
fn synthetic_go_source(funcs: usize) -> String {
    let mut src = String::from("package bench\n");
    for i in 0..funcs {
        let _ = write!(
            src,
            "\nfunc work{i}(n int) int {{\n\
             \ttotal := 0\n\
             \tfor j := 0; j < n; j++ {{\n\
             \t\ttotal += j\n\
             \t}}\n\
             \tif total > 100 {{\n\
             \t\ttotal = 100\n\
             \t}}\n\
             \treturn total\n\
             }}\n"
        );
    }
    src
}

/// Mark every other function's interior uncovered. Each generated function
/// occupies eleven lines (blank line plus ten of code).
fn synthetic_file_blocks(funcs: usize) -> Vec<CoverageBlock> {
    (0..funcs)
        .map(|i| {
            let first = (i * 11 + 4) as u32;
            CoverageBlock {
                range: CodeRange::new(SourcePos::new(first, 2), SourcePos::new(first + 6, 14)),
                hits: (i % 2) as u64,
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Classification
// ═══════════════════════════════════════════════════════════════════════════

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranges/classify");

    for size in [10usize, 100, 1_000, 10_000].iter() {
        let set = UncoveredRanges::from_blocks(synthetic_blocks(*size));
        let queries = synthetic_queries(256, (*size * 10) as u32);
        group.throughput(Throughput::Elements(queries.len() as u64));

        group.bench_with_input(BenchmarkId::new("ranges", size), &set, |b, set| {
            b.iter(|| {
                for q in &queries {
                    black_box(set.classify(black_box(q)));
                }
            })
        });
    }

    group.finish();
}

fn bench_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranges/from_blocks");

    for size in [100usize, 1_000, 10_000].iter() {
        let blocks = synthetic_blocks(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("blocks", size), &blocks, |b, blocks| {
            b.iter(|| UncoveredRanges::from_blocks(black_box(blocks.iter().copied())))
        });
    }

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Per-file Pipeline
// ═══════════════════════════════════════════════════════════════════════════

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontend/parse");
    group.sample_size(30);

    for funcs in [10usize, 100, 500].iter() {
        let src = synthetic_go_source(*funcs);
        group.throughput(Throughput::Bytes(src.len() as u64));

        group.bench_with_input(BenchmarkId::new("funcs", funcs), &src, |b, src| {
            b.iter(|| parse_file(black_box(src)).unwrap())
        });
    }

    group.finish();
}

fn bench_rewrite_and_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/rewrite_print");
    group.sample_size(30);

    for funcs in [10usize, 100, 500].iter() {
        let src = synthetic_go_source(*funcs);
        let file = parse_file(&src).unwrap();
        let ranges = UncoveredRanges::from_blocks(synthetic_file_blocks(*funcs));

        group.bench_with_input(BenchmarkId::new("funcs", funcs), &file, |b, file| {
            b.iter_batched(
                || file.clone(),
                |mut file| {
                    let outcome = Rewriter::new(&ranges, "panic").rewrite_file(&mut file);
                    black_box(outcome);
                    black_box(print_file(&file))
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_builder,
    bench_parse,
    bench_rewrite_and_print
);
criterion_main!(benches);
