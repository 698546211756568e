// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pen hover with a settle time.
//!
//! The pen enters, drifts, and only after the settle timeout is the hover
//! confirmed, at the latest position rather than where it entered. Touching
//! down ends the hover immediately.
//!
//! Run:
//! - `RUST_LOG=understory_gesture=debug cargo run -p understory_demos --example hover`

use kurbo::Point;
use understory_gesture::config::{EngineConfig, HoverOverrides};
use understory_gesture::coordinator::Coordinator;
use understory_gesture::event::{PointerEvent, PointerSample};
use understory_gesture::gesture::{GestureBehavior, GestureContext, GestureDefinition};
use understory_gesture::scheduler::VirtualScheduler;
use understory_gesture::types::PointerId;

struct Tooltip;

impl GestureBehavior for Tooltip {
    fn started(&mut self, cx: &mut GestureContext<'_>) {
        if let Some(p) = cx.pointers().first() {
            println!("  tooltip shown at {:?} (t={})", p.position, cx.now());
        }
    }

    fn ended(&mut self, cx: &mut GestureContext<'_>, _lifted: PointerId) {
        println!("  tooltip hidden (t={})", cx.now());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut c = Coordinator::with_settings(
        VirtualScheduler::new(),
        HoverOverrides::new(),
        EngineConfig::default(),
    );
    let canvas = c.add_surface();
    let toolbar = c.add_target(canvas).unwrap();
    // The toolbar reacts instantly.
    c.settings_mut().set(toolbar, Some(0));
    c.register(GestureDefinition::new("hint", canvas, &["hover"]).behavior(Tooltip))
        .unwrap();
    c.register(GestureDefinition::new("toolbar-hint", toolbar, &["hover"]).behavior(Tooltip))
        .unwrap();

    let pen = |x: f64, t| PointerSample::new(PointerId::pen(1), Point::new(x, x), t);

    println!("canvas, settle {}ms:", c.config().default_hover_timeout_ms);
    c.handle(PointerEvent::enter(canvas, pen(0.0, 0))).unwrap();
    c.handle(PointerEvent::moved(canvas, pen(25.0, 60))).unwrap();
    c.handle(PointerEvent::moved(canvas, pen(40.0, 120))).unwrap();
    c.advance_to(200).unwrap();
    println!("  pen touches down");
    c.handle(PointerEvent::down(canvas, pen(40.0, 260))).unwrap();
    c.handle(PointerEvent::up(canvas, pen(40.0, 300))).unwrap();
    c.advance_to(400).unwrap();

    println!("toolbar, no settle time:");
    c.handle(PointerEvent::enter(toolbar, pen(5.0, 500))).unwrap();
    c.handle(PointerEvent::leave(toolbar, pen(90.0, 540))).unwrap();
}
