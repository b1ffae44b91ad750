//! Marshaling benchmarks
//!
//! Cost of converting host value lists into packed native arrays, and of
//! writing a mapped frame buffer as PPM.

use std::borrow::Cow;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ospray::bridge::write_ppm;
use ospray::errors::BridgeResult;
use ospray::interop::marshal;
use ospray::HostValue;

#[derive(Clone)]
enum Value {
    Float(f64),
    Int(i64),
    List(Vec<Value>),
}

impl HostValue for Value {
    type Iter = std::vec::IntoIter<BridgeResult<Value>>;

    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::List(_) => "list",
        })
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<Cow<'_, str>> {
        None
    }

    fn elements(&self) -> Option<Self::Iter> {
        match self {
            Value::List(items) => {
                let items: Vec<_> = items.iter().cloned().map(Ok).collect();
                Some(items.into_iter())
            }
            _ => None,
        }
    }
}

fn vertices(n: usize) -> Value {
    Value::List((0..n * 4).map(|i| Value::Float(i as f64 * 0.5)).collect())
}

fn indices(n: usize) -> Value {
    Value::List((0..n * 3).map(|i| Value::Int(i as i64)).collect())
}

fn bench_to_floats(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_floats");

    for size in [4, 256, 16_384].iter() {
        let value = vertices(*size);
        group.bench_with_input(BenchmarkId::new("float3a", size), &value, |b, value| {
            b.iter(|| marshal::to_floats(black_box(value)))
        });
    }

    group.finish();
}

fn bench_to_ints(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_ints");

    for size in [2, 256, 16_384].iter() {
        let value = indices(*size);
        group.bench_with_input(BenchmarkId::new("int3", size), &value, |b, value| {
            b.iter(|| marshal::to_ints(black_box(value)))
        });
    }

    group.finish();
}

fn bench_write_ppm(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_ppm");

    for (width, height) in [(64usize, 48usize), (1024, 768)].iter() {
        let rgba = vec![127u8; width * height * 4];
        let mut out = Vec::with_capacity(width * height * 3 + 32);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &rgba,
            |b, rgba| {
                b.iter(|| {
                    out.clear();
                    write_ppm(&mut out, *width, *height, black_box(rgba))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_to_floats, bench_to_ints, bench_write_ppm);
criterion_main!(benches);
