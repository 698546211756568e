// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use understory_gesture::coordinator::{Coordinator, Effect};
use understory_gesture::event::{PointerEvent, PointerSample};
use understory_gesture::gesture::GestureDefinition;
use understory_gesture::scheduler::VirtualScheduler;
use understory_gesture::types::{PointerId, TargetId};

/// A root with `depth` nested children; every level registers a few gestures.
fn build(depth: usize) -> (Coordinator<VirtualScheduler>, Vec<TargetId>) {
    let mut c = Coordinator::new(VirtualScheduler::new());
    let mut chain = vec![c.add_surface()];
    for _ in 0..depth {
        let parent = *chain.last().unwrap();
        chain.push(c.add_target(parent).unwrap());
    }
    for (level, &t) in chain.iter().enumerate() {
        c.register(
            GestureDefinition::new(format!("double{level}"), t, &["touch"]).repeat(2, 250),
        )
        .unwrap();
        c.register(
            GestureDefinition::new(format!("pinch{level}"), t, &["touch:2"])
                .recognition_timeout(60),
        )
        .unwrap();
        c.register(GestureDefinition::new(format!("ink{level}"), t, &["pen"])).unwrap();
    }
    c.drain_effects();
    (c, chain)
}

fn touch(raw: u64, x: f64, t: u64) -> PointerSample {
    PointerSample::new(PointerId::touch(raw), Point::new(x, x), t)
}

/// Feed replayed events back like a host would.
fn pump(c: &mut Coordinator<VirtualScheduler>) -> usize {
    let mut n = 0;
    loop {
        let effects = c.drain_effects();
        if effects.is_empty() {
            return n;
        }
        for e in effects {
            if let Effect::Redispatch { event, .. } = e {
                n += 1;
                let _ = c.handle(event).unwrap();
            }
        }
    }
}

fn bench_pen_strokes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pen_stroke");
    for &moves in &[16_u64, 256] {
        group.throughput(Throughput::Elements(moves));
        group.bench_function(format!("moves_{moves}"), |b| {
            b.iter_batched(
                || build(0),
                |(mut c, chain)| {
                    let t = chain[0];
                    let pen = PointerId::pen(1);
                    let pressed = |x: f64, ts: u64| {
                        PointerSample::new(pen, Point::new(x, 0.0), ts)
                            .with_buttons(understory_gesture::types::PointerButtons::PRIMARY)
                    };
                    c.handle(PointerEvent::down(t, pressed(0.0, 0))).unwrap();
                    c.advance_to(0).unwrap();
                    for i in 1..=moves {
                        black_box(c.handle(PointerEvent::moved(t, pressed(i as f64, i))).unwrap());
                    }
                    c.handle(PointerEvent::up(t, pressed(0.0, moves + 1))).unwrap();
                    black_box(c.drain_effects().len())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_replay_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_chain");
    for &depth in &[1_usize, 4, 16] {
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter_batched(
                || build(depth),
                |(mut c, chain)| {
                    let leaf = *chain.last().unwrap();
                    c.handle(PointerEvent::down(leaf, touch(1, 0.0, 0))).unwrap();
                    for i in 1..8 {
                        c.handle(PointerEvent::moved(leaf, touch(1, i as f64, i))).unwrap();
                    }
                    // Every level waits for a second finger, then fails upward.
                    let mut now = 0;
                    let mut replayed = 0;
                    while let Some(next) = c.scheduler().next_deadline() {
                        now = now.max(next);
                        c.advance_to(now).unwrap();
                        replayed += pump(&mut c);
                    }
                    black_box(replayed)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pen_strokes, bench_replay_chain);
criterion_main!(benches);
