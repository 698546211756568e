// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size, Vec2};
use understory_shape::{ShapeKind, ShapeMatcher, ShapeQuery};

fn circle(n: usize) -> Vec<Point> {
    (0..=n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            Point::new(200.0, 200.0) + Vec2::from_angle(a) * 150.0
        })
        .collect()
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        // xorshift64*
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        let v = self.0.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (v >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn scribble(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = Rng(seed);
    (0..n)
        .map(|_| Point::new(rng.next_f64() * 300.0, rng.next_f64() * 300.0))
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let matcher = ShapeMatcher::default();
    let mut group = c.benchmark_group("classify");
    for &n in &[64_usize, 1024] {
        let round = circle(n);
        let noise = scribble(n, 0x9E37_79B9_7F4A_7C15);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("circle_{n}"), |b| {
            b.iter(|| black_box(matcher.classify(black_box(&round), &ShapeQuery::default())));
        });
        group.bench_function(format!("scribble_{n}"), |b| {
            b.iter(|| black_box(matcher.classify(black_box(&noise), &ShapeQuery::default())));
        });
        let only = [ShapeKind::Rectangle, ShapeKind::Line];
        let restricted = ShapeQuery {
            target: Some(Size::new(400.0, 400.0)),
            only: Some(&only),
            ..ShapeQuery::default()
        };
        group.bench_function(format!("restricted_{n}"), |b| {
            b.iter(|| black_box(matcher.classify(black_box(&round), &restricted)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
