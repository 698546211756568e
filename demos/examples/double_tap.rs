// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Double tap versus single tap.
//!
//! The double tap is registered first so it gets the first look at every tap.
//! Its first occurrence is provisional; if no second tap follows within the
//! repeat timeout, the held events are released and the single tap wins the
//! next attempt.
//!
//! Run:
//! - `cargo run -p understory_demos --example double_tap`

use kurbo::Point;
use understory_gesture::coordinator::{Coordinator, Effect};
use understory_gesture::event::{PointerEvent, PointerSample};
use understory_gesture::gesture::{GestureBehavior, GestureContext, GestureDefinition};
use understory_gesture::scheduler::VirtualScheduler;
use understory_gesture::types::{PointerId, TargetId};

struct Say;

impl GestureBehavior for Say {
    fn started(&mut self, cx: &mut GestureContext<'_>) {
        println!("  {} at t={}", cx.name(), cx.now());
    }
}

fn tap(c: &mut Coordinator<VirtualScheduler>, t: TargetId, at: u64) {
    let finger = |ts| PointerSample::new(PointerId::touch(1), Point::new(20.0, 20.0), ts);
    c.handle(PointerEvent::down(t, finger(at))).unwrap();
    c.advance_to(at).unwrap();
    c.handle(PointerEvent::up(t, finger(at + 30))).unwrap();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut c = Coordinator::new(VirtualScheduler::new());
    let s = c.add_surface();
    c.register(
        GestureDefinition::new("double-tap", s, &["touch"])
            .repeat(2, 300)
            .behavior(Say),
    )
    .unwrap();
    c.register(GestureDefinition::new("tap", s, &["touch"]).behavior(Say))
        .unwrap();
    for (later, earlier) in c.registry().repeat_order_conflicts(s) {
        println!("warning: {later:?} can never win against {earlier:?}");
    }

    println!("taps 120ms apart:");
    tap(&mut c, s, 0);
    tap(&mut c, s, 120);
    c.advance_to(1_000).unwrap();

    println!("taps 500ms apart:");
    c.drain_effects();
    tap(&mut c, s, 2_000);
    c.advance_to(2_300).unwrap();
    let released = c
        .drain_effects()
        .iter()
        .filter(|e| matches!(e, Effect::Redispatch { .. }))
        .count();
    println!("  repeat window expired, {released} events released");
    tap(&mut c, s, 2_500);
}
