//! Benchmarks for ipgeo loading and query performance.
//!
//! Run with: cargo bench
//!
//! This benchmark suite measures:
//! - IPv4 and IPv6 lookup throughput
//! - Full location resolution from address text
//! - Artifact load time
//! - Scalability with different table sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipgeo::binary::{ArtifactWriter, IntermediateTables};
use ipgeo::{GeoTables, Locator, RangeV4, RangeV6};

/// Generate an artifact with evenly spaced ranges covering both address spaces.
fn generate_artifact(v4_count: usize, v6_count: usize) -> Vec<u8> {
    let mut tables = IntermediateTables::new();

    let names: Vec<u32> = (0..250)
        .map(|i| tables.strings.intern(&format!("Place {}", i)).unwrap())
        .collect();

    let v4_step = (u32::MAX as u64 + 1) / v4_count as u64;
    for i in 0..v4_count {
        let name = names[i % names.len()];
        tables.v4.push(RangeV4 {
            range_start: (i as u64 * v4_step) as u32,
            country_index: name,
            region_index: name,
            city_index: name,
            timezone_offset: ((i % 27) as i32 - 12) * 3600,
        });
    }

    let v6_step = u128::MAX / v6_count.max(1) as u128;
    for i in 0..v6_count {
        let name = names[i % names.len()];
        tables.v6.push(RangeV6 {
            range_start: (i as u128 * v6_step).to_be_bytes(),
            country_index: name,
            region_index: name,
            city_index: name,
            timezone_offset: 0,
        });
    }

    ArtifactWriter::new().to_vec(&tables).unwrap()
}

/// Generate pseudo-random IPv4 query strings.
fn generate_v4_queries(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let x = (i as u32).wrapping_mul(2_654_435_761);
            std::net::Ipv4Addr::from(x).to_string()
        })
        .collect()
}

/// Generate pseudo-random IPv6 query strings.
fn generate_v6_queries(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let x = (i as u128).wrapping_mul(0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C835);
            std::net::Ipv6Addr::from(x).to_string()
        })
        .collect()
}

/// Benchmark IPv4 lookup throughput.
fn bench_lookup_v4(c: &mut Criterion) {
    let data = generate_artifact(3_000_000, 0);
    let locator = Locator::new(GeoTables::from_gz_bytes(&data).unwrap());
    let queries = generate_v4_queries(1000);

    let mut group = c.benchmark_group("lookup_v4");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("text_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(locator.lookup_v4(query));
            }
        })
    });

    let parsed: Vec<std::net::Ipv4Addr> = queries.iter().map(|q| q.parse().unwrap()).collect();
    group.bench_function("parsed_queries", |b| {
        b.iter(|| {
            for addr in &parsed {
                black_box(locator.lookup_ipv4(*addr));
            }
        })
    });

    group.finish();
}

/// Benchmark IPv6 lookup throughput.
fn bench_lookup_v6(c: &mut Criterion) {
    let data = generate_artifact(1, 1_000_000);
    let locator = Locator::new(GeoTables::from_gz_bytes(&data).unwrap());
    let queries = generate_v6_queries(1000);

    let mut group = c.benchmark_group("lookup_v6");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("text_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(locator.lookup_v6(query));
            }
        })
    });

    group.finish();
}

/// Benchmark full resolution including string lookups.
fn bench_locate(c: &mut Criterion) {
    let data = generate_artifact(100_000, 100_000);
    let locator = Locator::new(GeoTables::from_gz_bytes(&data).unwrap());

    let mut queries = generate_v4_queries(500);
    queries.extend(generate_v6_queries(500));

    let mut group = c.benchmark_group("locate");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("mixed_families", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(locator.locate(query));
            }
        })
    });

    group.bench_function("invalid_input", |b| {
        b.iter(|| black_box(locator.locate("not.an.ip.address")))
    });

    group.finish();
}

/// Benchmark artifact load time.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    group.sample_size(10);

    for size in [10_000, 100_000, 1_000_000].iter() {
        let data = generate_artifact(*size, size / 10);

        println!(
            "Artifact with {} IPv4 ranges: {} bytes ({:.2} MB)",
            size,
            data.len(),
            data.len() as f64 / 1024.0 / 1024.0
        );

        group.bench_with_input(BenchmarkId::new("ranges", size), &data, |b, data| {
            b.iter(|| black_box(GeoTables::from_gz_bytes(data).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark scalability with different table sizes.
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");
    let queries = generate_v4_queries(100);

    for size in [1_000, 100_000, 3_000_000].iter() {
        let data = generate_artifact(*size, 0);
        let locator = Locator::new(GeoTables::from_gz_bytes(&data).unwrap());

        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(BenchmarkId::new("ranges", size), size, |b, _| {
            b.iter(|| {
                for query in &queries {
                    black_box(locator.lookup_v4(query));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lookup_v4,
    bench_lookup_v6,
    bench_locate,
    bench_load,
    bench_scalability,
);

criterion_main!(benches);
