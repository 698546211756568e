// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for the coordinator driven by arbitrary pointer traffic.
//!
//! A small host loop feeds random down/move/up/enter/leave sequences and
//! timer advances into a two-level target tree, redispatching replayed events
//! the way a real host would, and checks after every step that:
//!
//! 1. No internal-consistency error is ever raised.
//! 2. A pointer is never both down and hovering on the same target.
//! 3. Capture and release effects pair up: no double capture, no stray release.
//! 4. Once every pointer is gone and all timers ran, nothing is postponed,
//!    captured, or running.

use std::collections::BTreeSet;

use kurbo::Point;
use proptest::prelude::*;
use understory_gesture::coordinator::{Coordinator, Effect};
use understory_gesture::event::{PointerEvent, PointerSample};
use understory_gesture::gesture::GestureDefinition;
use understory_gesture::scheduler::VirtualScheduler;
use understory_gesture::types::{PointerId, TargetId};

#[derive(Clone, Debug)]
enum Op {
    Down { finger: u64, on_child: bool },
    Move { finger: u64 },
    Up { finger: u64 },
    PenEnter { on_child: bool },
    PenMove,
    PenLeave,
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..4, any::<bool>()).prop_map(|(finger, on_child)| Op::Down { finger, on_child }),
        (1u64..4).prop_map(|finger| Op::Move { finger }),
        (1u64..4).prop_map(|finger| Op::Up { finger }),
        any::<bool>().prop_map(|on_child| Op::PenEnter { on_child }),
        Just(Op::PenMove),
        Just(Op::PenLeave),
        (0u64..250).prop_map(Op::Advance),
    ]
}

struct Host {
    c: Coordinator<VirtualScheduler>,
    root: TargetId,
    child: TargetId,
    now: u64,
    // finger -> target it went down on
    down: Vec<(u64, TargetId)>,
    pen_over: Option<TargetId>,
    captured: BTreeSet<PointerId>,
}

impl Host {
    fn new() -> Self {
        let mut c = Coordinator::new(VirtualScheduler::new());
        let root = c.add_surface();
        let child = c.add_target(root).unwrap();
        c.register(GestureDefinition::new("pinch", root, &["touch:2"]).recognition_timeout(50))
            .unwrap();
        c.register(GestureDefinition::new("pan", root, &["touch"]).recognition_timeout(20))
            .unwrap();
        c.register(GestureDefinition::new("press", child, &["touch"]).completion_timeout(100))
            .unwrap();
        c.register(GestureDefinition::new("hint", child, &["hover"]))
            .unwrap();
        Self {
            c,
            root,
            child,
            now: 0,
            down: Vec::new(),
            pen_over: None,
            captured: BTreeSet::new(),
        }
    }

    fn sample(&self, pointer: PointerId) -> PointerSample {
        let x = (self.now % 97) as f64;
        PointerSample::new(pointer, Point::new(x, x), self.now)
    }

    fn send(&mut self, event: PointerEvent) {
        self.c.handle(event).unwrap();
        self.pump();
    }

    /// Apply effects; replayed events go back into the coordinator.
    fn pump(&mut self) {
        loop {
            let effects = self.c.drain_effects();
            if effects.is_empty() {
                return;
            }
            for effect in effects {
                match effect {
                    Effect::Capture { pointer, .. } => {
                        assert!(self.captured.insert(pointer), "{pointer} captured twice");
                    }
                    Effect::ReleaseCapture { pointer, .. } => {
                        assert!(self.captured.remove(&pointer), "{pointer} released but not captured");
                    }
                    Effect::Redispatch { event, .. } => {
                        self.c.handle(event).unwrap();
                    }
                    _ => {}
                }
            }
        }
    }

    fn apply(&mut self, op: &Op) {
        self.now += 1;
        match *op {
            Op::Down { finger, on_child } => {
                if self.down.iter().any(|(f, _)| *f == finger) {
                    return;
                }
                let target = if on_child { self.child } else { self.root };
                self.down.push((finger, target));
                let s = self.sample(PointerId::touch(finger));
                self.send(PointerEvent::down(target, s));
            }
            Op::Move { finger } => {
                if let Some(&(_, target)) = self.down.iter().find(|(f, _)| *f == finger) {
                    let s = self.sample(PointerId::touch(finger));
                    self.send(PointerEvent::moved(target, s));
                }
            }
            Op::Up { finger } => {
                if let Some(i) = self.down.iter().position(|(f, _)| *f == finger) {
                    let (_, target) = self.down.remove(i);
                    let s = self.sample(PointerId::touch(finger));
                    self.send(PointerEvent::up(target, s));
                }
            }
            Op::PenEnter { on_child } => {
                if self.pen_over.is_none() {
                    let target = if on_child { self.child } else { self.root };
                    self.pen_over = Some(target);
                    let s = self.sample(PointerId::pen(1));
                    self.send(PointerEvent::enter(target, s));
                }
            }
            Op::PenMove => {
                if let Some(target) = self.pen_over {
                    let s = self.sample(PointerId::pen(1));
                    self.send(PointerEvent::moved(target, s));
                }
            }
            Op::PenLeave => {
                if let Some(target) = self.pen_over.take() {
                    let s = self.sample(PointerId::pen(1));
                    self.send(PointerEvent::leave(target, s));
                }
            }
            Op::Advance(ms) => {
                self.now += ms;
                self.c.advance_to(self.now).unwrap();
                self.pump();
            }
        }
    }

    fn check_tracker(&self) {
        let tracker = self.c.tracker();
        for target in [self.root, self.child] {
            for pointer in tracker.down_pointers(target) {
                assert!(
                    !tracker.is_hovering_on(target, pointer),
                    "{pointer} both down and hovering on {target}"
                );
            }
            assert_eq!(
                tracker.has_down_group(target),
                tracker.down_pointers(target).next().is_some(),
                "empty down group kept on {target}"
            );
        }
    }

    fn finish(&mut self) {
        for (finger, target) in core::mem::take(&mut self.down) {
            self.now += 1;
            let s = self.sample(PointerId::touch(finger));
            self.send(PointerEvent::up(target, s));
        }
        if let Some(target) = self.pen_over.take() {
            self.now += 1;
            let s = self.sample(PointerId::pen(1));
            self.send(PointerEvent::leave(target, s));
        }
        self.now += 1_000;
        self.c.advance_to(self.now).unwrap();
        self.pump();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn traffic_keeps_engine_consistent(ops in prop::collection::vec(op(), 1..60)) {
        let mut host = Host::new();
        for op in &ops {
            host.apply(op);
            host.check_tracker();
        }
        host.finish();

        prop_assert!(host.captured.is_empty());
        for target in [host.root, host.child] {
            let state = host.c.target_state(target).unwrap();
            prop_assert!(!state.is_postponing(), "{target} still postponing: {state:?}");
            prop_assert!(host.c.postponed(target).is_empty());
            prop_assert_eq!(host.c.active_gesture_count(target), 0);
            prop_assert!(!host.c.tracker().has_pointers(target));
        }
        prop_assert_eq!(host.c.scheduler().pending_len(), 0);
    }
}
