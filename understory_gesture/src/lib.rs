// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_gesture --heading-base-level=0

//! Understory Gesture: a deterministic, `no_std` multi-pointer gesture engine.
//!
//! ## Overview
//!
//! This crate decides which gesture, if any, a set of pointers on a UI element
//! is performing. Raw pointer events from pen, touch, and mouse are collected
//! for a short acquisition window, matched against declarative gesture
//! definitions in priority order, and then either committed (the winning
//! gesture captures its pointers and is told it started) or replayed to the
//! parent element so an ancestor gets a chance to recognize them.
//!
//! It does not perform hit testing or rendering. Hosts resolve which element
//! an event belongs to, feed it to a [`Coordinator`](crate::coordinator::Coordinator),
//! and carry out the [`Effect`](crate::coordinator::Effect)s it returns.
//!
//! ## Pieces
//!
//! - [`tracker`]: down, hover, and latest-move bookkeeping per target.
//! - [`hover`]: turns a raw enter into a confirmed hover after a settle time.
//! - [`target`]: the per-target `Idle → Acquiring → Recognized → AwaitingCompletion` machine.
//! - [`matcher`]: picks the first registered gesture whose pointer requirements,
//!   timing, exclusivity, and repeat count are satisfied.
//! - [`relay`]: postpones events while a target is undecided and replays them upward.
//! - [`registry`]: gesture registration, unique names, and group enablement.
//! - [`permutation`]: pointer-type requirements such as `touch:2+pen`.
//!
//! Timers go through a [`Scheduler`](crate::scheduler::Scheduler). The
//! [`VirtualScheduler`](crate::scheduler::VirtualScheduler) runs them on a
//! logical clock, which makes the engine fully deterministic under test.
//!
//! ## Outcomes
//!
//! Every call to [`Coordinator::handle`](crate::coordinator::Coordinator::handle)
//! returns an [`Outcome`](crate::types::Outcome):
//! - `Continue`: let the raw event bubble.
//! - `Stop`: stop bubbling, but peers at this element still see it. Used for
//!   moves while a recognized gesture is in its completion period.
//! - `StopAndConsume`: the event was postponed or belongs to a running gesture.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use understory_gesture::coordinator::{Coordinator, Effect};
//! use understory_gesture::event::{EventKind, PointerEvent, PointerSample};
//! use understory_gesture::gesture::GestureDefinition;
//! use understory_gesture::scheduler::VirtualScheduler;
//! use understory_gesture::types::PointerId;
//!
//! let mut c = Coordinator::new(VirtualScheduler::new());
//! let root = c.add_surface();
//! let button = c.add_target(root).unwrap();
//! c.register(GestureDefinition::new("pinch", button, &["touch:2"]).recognition_timeout(100))
//!     .unwrap();
//!
//! // One finger is not a pinch: after the window closes, the input is replayed to the root.
//! let finger = PointerSample::new(PointerId::touch(7), Point::new(10.0, 10.0), 0);
//! c.handle(PointerEvent::down(button, finger)).unwrap();
//! c.advance_to(100).unwrap();
//!
//! let replayed: Vec<_> = c
//!     .drain_effects()
//!     .into_iter()
//!     .filter_map(|e| match e {
//!         Effect::Redispatch { to, event } => Some((to, event.kind)),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(replayed, [(root, EventKind::Down)]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod coordinator;
pub mod diag;
pub mod error;
pub mod event;
pub mod gesture;
pub mod hover;
pub mod matcher;
pub mod permutation;
pub mod registry;
pub mod relay;
pub mod scheduler;
pub mod target;
pub mod tracker;
pub mod types;
