// In copybin-core/benches/codec_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use copybin::kernels::{decode_column, encode_column};
use copybin::types::{FieldSpec, LogicalType, TypedColumn};

// --- Mock Data Generation ---

/// Every 16th value is null so the sentinel paths are exercised.
fn generate_ints(rows: usize) -> TypedColumn {
    TypedColumn::Int64(
        (0..rows)
            .map(|i| (i % 16 != 0).then_some(i as i64 * 7919 - 1_000_000))
            .collect(),
    )
}

fn generate_text(rows: usize) -> TypedColumn {
    TypedColumn::Text(
        (0..rows)
            .map(|i| (i % 16 != 0).then(|| format!("row-{i}-{}", "x".repeat(i % 24))))
            .collect(),
    )
}

fn generate_decimals(rows: usize) -> TypedColumn {
    TypedColumn::decimal(
        12,
        2,
        (0..rows)
            .map(|i| (i % 16 != 0).then_some(i as i128 * 101 - 50_000))
            .collect(),
    )
}

// --- Benchmark Suite ---

const BENCH_ROWS: usize = 65536;

fn bench_column_codecs(c: &mut Criterion) {
    let cases = [
        ("int64", generate_ints(BENCH_ROWS)),
        ("text", generate_text(BENCH_ROWS)),
        ("decimal(12,2)", generate_decimals(BENCH_ROWS)),
    ];

    let mut group = c.benchmark_group("Column Codecs");
    group.throughput(Throughput::Elements(BENCH_ROWS as u64));

    for (label, column) in &cases {
        let logical_type = column.logical_type();
        let field = FieldSpec::new(*label, logical_type);
        let encoded = encode_column(column, &logical_type).unwrap();

        group.bench_function(format!("Encode {label}"), |b| {
            b.iter(|| black_box(encode_column(black_box(column), &logical_type)))
        });
        group.bench_function(format!("Decode {label}"), |b| {
            b.iter(|| black_box(decode_column(black_box(&encoded), &field)))
        });
    }

    // Decimals re-scaled on the way out cost an extra multiply per row.
    let widened = LogicalType::Decimal {
        precision: 18,
        scale: 4,
    };
    group.bench_function("Encode decimal(12,2) as decimal(18,4)", |b| {
        b.iter(|| black_box(encode_column(black_box(&cases[2].1), &widened)))
    });

    group.finish();
}

criterion_group!(benches, bench_column_codecs);
criterion_main!(benches);
