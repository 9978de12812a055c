//! Throughput benchmarks

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use gnss_reader::core::protocol::{checksum, decode, encoder, FrameScanner, MessageId, Scanned};
use std::hint::black_box;

/// NAV-PVT, NAV-DOP and a GGA sentence, repeated
fn capture(epochs: usize) -> Vec<u8> {
    let pvt = encoder::encode(MessageId::NAV_PVT, &[0u8; 92]).unwrap();
    let dop = encoder::encode(MessageId::NAV_DOP, &[0u8; 18]).unwrap();
    let gga = b"$GNGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,*5B\r\n";

    let mut out = Vec::new();
    for _ in 0..epochs {
        out.extend_from_slice(&pvt);
        out.extend_from_slice(&dop);
        out.extend_from_slice(gga);
    }
    out
}

fn scanner_benchmark(c: &mut Criterion) {
    let data = capture(100);

    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for chunk in [16usize, 512, 4096] {
        group.bench_function(format!("scan_chunk_{}", chunk), |b| {
            b.iter(|| {
                let mut scanner = FrameScanner::new();
                let mut frames = 0usize;
                for piece in black_box(&data).chunks(chunk) {
                    scanner.feed(piece);
                    while let Some(unit) = scanner.next() {
                        if matches!(unit, Scanned::Binary(_)) {
                            frames += 1;
                        }
                    }
                }
                black_box(frames)
            })
        });
    }

    group.bench_function("scan_and_decode", |b| {
        b.iter(|| {
            let mut scanner = FrameScanner::new();
            scanner.feed(black_box(&data));
            let mut decoded = 0usize;
            while let Some(unit) = scanner.next() {
                if let Scanned::Binary(frame) = unit {
                    if decode(&frame).is_ok() {
                        decoded += 1;
                    }
                }
            }
            black_box(decoded)
        })
    });

    group.finish();
}

fn checksum_benchmark(c: &mut Criterion) {
    let data: Vec<u8> = (0..2048).map(|i| (i % 256) as u8).collect();

    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("ck_2048", |b| {
        b.iter(|| black_box(checksum::calculate(black_box(&data))))
    });

    group.finish();
}

criterion_group!(benches, scanner_benchmark, checksum_benchmark);
criterion_main!(benches);
