// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tap on a child, pinch on the root.
//!
//! A one-finger touch on the child is recognized as a tap and captured. Two
//! fingers are not a tap, so after the child's window closes the postponed
//! events are replayed to the root, where the pinch picks them up.
//!
//! Run:
//! - `RUST_LOG=understory_gesture=debug cargo run -p understory_demos --example gesture_basics`

use kurbo::Point;
use understory_gesture::coordinator::{Coordinator, Effect};
use understory_gesture::event::{PointerEvent, PointerSample};
use understory_gesture::gesture::{GestureBehavior, GestureContext, GestureDefinition};
use understory_gesture::scheduler::VirtualScheduler;
use understory_gesture::types::PointerId;

struct Say;

impl GestureBehavior for Say {
    fn started(&mut self, cx: &mut GestureContext<'_>) {
        let at: Vec<_> = cx.pointers().iter().map(|p| (p.pointer, p.position)).collect();
        println!("  [{}] started on {} with {:?}", cx.name(), cx.target(), at);
    }

    fn ended(&mut self, cx: &mut GestureContext<'_>, lifted: PointerId) {
        println!("  [{}] ended ({} lifted)", cx.name(), lifted);
    }
}

fn pump(c: &mut Coordinator<VirtualScheduler>) {
    loop {
        let effects = c.drain_effects();
        if effects.is_empty() {
            return;
        }
        for e in effects {
            match e {
                Effect::Redispatch { to, event } => {
                    println!("  replay {:?} {} -> {}", event.kind, event.pointer(), to);
                    c.handle(event).unwrap();
                }
                other => println!("  effect {other:?}"),
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut c = Coordinator::new(VirtualScheduler::new());
    let root = c.add_surface();
    let card = c.add_target(root).unwrap();
    c.register(
        GestureDefinition::new("zoom", root, &["touch:2"])
            .recognition_timeout(80)
            .behavior(Say),
    )
    .unwrap();
    c.register(
        GestureDefinition::new("tap", card, &["touch"])
            .recognition_timeout(40)
            .behavior(Say),
    )
    .unwrap();
    pump(&mut c);

    println!("one finger on the card:");
    let f1 = |x: f64, t| PointerSample::new(PointerId::touch(1), Point::new(x, 10.0), t);
    c.handle(PointerEvent::down(card, f1(10.0, 0))).unwrap();
    c.advance_to(40).unwrap();
    pump(&mut c);
    c.handle(PointerEvent::up(card, f1(10.0, 90))).unwrap();
    pump(&mut c);

    println!("two fingers on the card:");
    let f2 = |x: f64, t| PointerSample::new(PointerId::touch(2), Point::new(x, 10.0), t);
    c.handle(PointerEvent::down(card, f1(10.0, 200))).unwrap();
    c.handle(PointerEvent::down(card, f2(60.0, 210))).unwrap();
    c.advance_to(240).unwrap();
    pump(&mut c);
    c.advance_to(400).unwrap();
    pump(&mut c);
    c.handle(PointerEvent::up(card, f2(80.0, 450))).unwrap();
    c.handle(PointerEvent::up(card, f1(0.0, 460))).unwrap();
    pump(&mut c);
}
