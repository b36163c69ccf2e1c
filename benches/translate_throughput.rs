//! Event translation throughput benchmark.
//!
//! Measures split/parse/format latency for typical hub notifications
//! using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use telldus_bridge::events::{format, parse_params, split, translate};

const EVENTS: &[(&str, &str)] = &[
    (
        "arctech",
        "16:TDRawDeviceEvent95:class:command;protocol:arctech;model:selflearning;house:29145578;unit:2;group:0;method:turnoff;i1s",
    ),
    (
        "sensor",
        "16:TDRawDeviceEvent;class:sensor;protocol:mandolyn;model:temperaturehumidity;id:11;temp:22.4;humidity:38;i2s",
    ),
];

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    for &(name, event) in EVENTS {
        group.bench_with_input(BenchmarkId::from_parameter(name), event, |b, e| {
            b.iter(|| split(black_box(e)));
        });
    }
    group.finish();
}

fn bench_parse_and_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_format");
    for &(name, event) in EVENTS {
        let parsed = split(event);
        group.bench_with_input(BenchmarkId::from_parameter(name), &parsed.fields, |b, f| {
            b.iter(|| {
                let params = parse_params(black_box(f.as_slice())).unwrap();
                format(&params).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_translate(c: &mut Criterion) {
    let event = EVENTS[0].1;
    c.bench_function("translate_arctech", |b| {
        b.iter(|| translate(black_box(event)).unwrap());
    });
}

criterion_group!(benches, bench_split, bench_parse_and_format, bench_translate);
criterion_main!(benches);
