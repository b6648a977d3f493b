//! Value codec benchmarks.
//!
//! Run with: cargo bench --bench codec

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sentinel_cache::cache::{decode, encode, CacheValue, EncodedValue};
use std::collections::BTreeMap;

fn sample_map(fields: usize) -> CacheValue {
  let mut map = BTreeMap::new();
  for i in 0..fields {
    map.insert(format!("field_{}", i), CacheValue::from(format!("value {}", i)));
  }
  map.insert("count".to_string(), CacheValue::Int(fields as i64));
  map.insert("ratio".to_string(), CacheValue::Float(0.75));
  CacheValue::Map(map)
}

fn bench_encode(c: &mut Criterion) {
  let mut group = c.benchmark_group("encode");
  group.throughput(Throughput::Elements(1));

  group.bench_function("integer", |b| {
    let value = CacheValue::Int(123_456);
    b.iter(|| black_box(encode(&value).unwrap()));
  });

  group.bench_function("text", |b| {
    let value = CacheValue::from("session:abcdef0123456789");
    b.iter(|| black_box(encode(&value).unwrap()));
  });

  for fields in [4, 32, 256].iter() {
    let value = sample_map(*fields);
    group.bench_with_input(BenchmarkId::new("map", fields), &value, |b, value| {
      b.iter(|| black_box(encode(value).unwrap()));
    });
  }

  group.finish();
}

fn bench_decode(c: &mut Criterion) {
  let mut group = c.benchmark_group("decode");
  group.throughput(Throughput::Elements(1));

  group.bench_function("stored_integer", |b| {
    b.iter(|| black_box(decode(EncodedValue::from_stored(b"123456".to_vec()))));
  });

  group.bench_function("foreign_bytes", |b| {
    b.iter(|| black_box(decode(EncodedValue::Bytes(b"not-a-serialized-blob".to_vec()))));
  });

  for fields in [4, 32, 256].iter() {
    let wire = encode(&sample_map(*fields)).unwrap().to_wire();
    group.bench_with_input(BenchmarkId::new("map", fields), &wire, |b, wire| {
      b.iter(|| black_box(decode(EncodedValue::from_stored(wire.clone()))));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
