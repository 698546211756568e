// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ink a stroke with the pen and classify it when the pen lifts.
//!
//! The ink gesture asks the engine to forward its pen to the ink layer. The
//! forwarded moves are collected into a stroke, and the finished stroke is
//! matched against the default shape library.
//!
//! Run:
//! - `RUST_LOG=understory_shape=trace cargo run -p understory_demos --example shape_match`

use kurbo::{Point, Size, Vec2};
use understory_gesture::coordinator::{Coordinator, Effect};
use understory_gesture::event::{PointerEvent, PointerSample};
use understory_gesture::gesture::{GestureBehavior, GestureContext, GestureDefinition};
use understory_gesture::scheduler::VirtualScheduler;
use understory_gesture::types::{PointerButtons, PointerId, TargetId};
use understory_shape::{ShapeQuery, classify};

struct Ink;

impl GestureBehavior for Ink {
    fn started(&mut self, cx: &mut GestureContext<'_>) {
        if let Some(p) = cx.pointers().first() {
            cx.drive_ink(p.pointer);
        }
    }
}

fn draw(c: &mut Coordinator<VirtualScheduler>, t: TargetId, path: &[Point], start: u64) {
    let pen = |p: Point, ts| {
        PointerSample::new(PointerId::pen(1), p, ts).with_buttons(PointerButtons::PRIMARY)
    };
    let mut stroke = vec![path[0]];
    c.handle(PointerEvent::down(t, pen(path[0], start))).unwrap();
    c.advance_to(start).unwrap();
    let mut ts = start;
    for &p in &path[1..] {
        ts += 8;
        c.handle(PointerEvent::moved(t, pen(p, ts))).unwrap();
    }
    c.handle(PointerEvent::up(t, pen(path[path.len() - 1], ts + 8))).unwrap();

    for effect in c.drain_effects() {
        match effect {
            Effect::InkMove(e) => stroke.push(e.sample.position),
            Effect::InkUp(e) => {
                stroke.push(e.sample.position);
                let query = ShapeQuery {
                    target: Some(Size::new(400.0, 400.0)),
                    ..ShapeQuery::default()
                };
                match classify(&stroke, &query) {
                    Some(m) => println!("  {:?} ({:.0}% inside)", m.kind, m.fraction * 100.0),
                    None => println!("  no shape"),
                }
            }
            _ => {}
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut c = Coordinator::new(VirtualScheduler::new());
    let canvas = c.add_surface();
    c.register(GestureDefinition::new("ink", canvas, &["pen"]).behavior(Ink))
        .unwrap();

    println!("circle:");
    let circle: Vec<Point> = (0..=40)
        .map(|i| {
            let a = std::f64::consts::TAU * f64::from(i) / 40.0;
            Point::new(200.0, 200.0) + Vec2::from_angle(a) * 120.0
        })
        .collect();
    draw(&mut c, canvas, &circle, 0);

    println!("line:");
    let line: Vec<Point> = (0..=30)
        .map(|i| Point::new(40.0 + f64::from(i) * 10.0, 100.0 + f64::from(i % 3)))
        .collect();
    draw(&mut c, canvas, &line, 1_000);

    println!("rectangle:");
    let corners = [
        Point::new(50.0, 50.0),
        Point::new(350.0, 50.0),
        Point::new(350.0, 250.0),
        Point::new(50.0, 250.0),
        Point::new(50.0, 50.0),
    ];
    let rect: Vec<Point> = corners
        .windows(2)
        .flat_map(|w| (0..12).map(move |i| w[0].lerp(w[1], f64::from(i) / 12.0)))
        .chain([corners[4]])
        .collect();
    draw(&mut c, canvas, &rect, 2_000);
}
