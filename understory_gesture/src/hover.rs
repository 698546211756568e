// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover detector: turn a raw enter into a confirmed hover after a settle time.
//!
//! ## Overview
//!
//! Each hover-capable pointer runs a small state machine:
//!
//! ```text
//! Idle --enter--> Arming --settle timer--> Confirmed --leave/contact--> Idle
//!                   |                                    ^
//!                   +------------- leave/contact --------+
//! ```
//!
//! While arming, moves update the pointer's latest sample without publishing
//! it, so the synthesized hover start carries the freshest position rather
//! than the enter position. A zero settle time skips arming and confirms with
//! the enter sample.
//!
//! The detector only keeps state. The [`Coordinator`](crate::coordinator::Coordinator)
//! decides eligibility, owns the timers, and feeds confirmed hovers into the
//! tracker.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::Point;
//! use understory_gesture::event::PointerSample;
//! use understory_gesture::hover::{HoverDetector, HoverPhase};
//! use understory_gesture::scheduler::{Scheduler, TimerToken, VirtualScheduler};
//! use understory_gesture::types::PointerId;
//! # use understory_gesture::coordinator::Coordinator;
//! # let mut c = Coordinator::new(VirtualScheduler::new());
//! # let surface = c.add_surface();
//!
//! let pen = PointerId::pen(1);
//! let mut timers = VirtualScheduler::new();
//! let mut hover = HoverDetector::new();
//!
//! let timer = timers.schedule_once(0, 150, TimerToken::HoverSettle(pen));
//! hover.arm(surface, PointerSample::new(pen, Point::ZERO, 0), timer);
//! hover.track(PointerSample::new(pen, Point::new(40.0, 40.0), 100));
//!
//! let due = timers.pop_due(150).unwrap();
//! let (_, sample) = hover.settle(pen, due.handle, due.deadline).unwrap();
//! assert_eq!(sample.position, Point::new(40.0, 40.0));
//! assert_eq!(hover.phase(pen), HoverPhase::Confirmed);
//! ```

use alloc::collections::BTreeMap;

use crate::event::PointerSample;
use crate::scheduler::TimerHandle;
use crate::types::{PointerId, TargetId};

/// Hover phase of one pointer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HoverPhase {
    /// Not hovering and not arming.
    Idle,
    /// Settle timer running.
    Arming,
    /// Hover confirmed.
    Confirmed,
}

#[derive(Copy, Clone, Debug)]
enum Record {
    Arming {
        target: TargetId,
        timer: TimerHandle,
        latest: PointerSample,
    },
    Confirmed {
        target: TargetId,
    },
}

/// What a cancellation tore down.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct HoverCancel {
    /// Settle timer to cancel, if the pointer was arming.
    pub timer: Option<TimerHandle>,
    /// Target whose confirmed hover ended, if the pointer was confirmed.
    pub confirmed_on: Option<TargetId>,
}

/// Per-pointer hover state machines.
#[derive(Clone, Debug, Default)]
pub struct HoverDetector {
    records: BTreeMap<PointerId, Record>,
}

impl HoverDetector {
    /// Create an idle detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase of `pointer`.
    pub fn phase(&self, pointer: PointerId) -> HoverPhase {
        match self.records.get(&pointer) {
            None => HoverPhase::Idle,
            Some(Record::Arming { .. }) => HoverPhase::Arming,
            Some(Record::Confirmed { .. }) => HoverPhase::Confirmed,
        }
    }

    /// Target `pointer` is arming or hovering on.
    pub fn target_of(&self, pointer: PointerId) -> Option<TargetId> {
        match self.records.get(&pointer)? {
            Record::Arming { target, .. } | Record::Confirmed { target } => Some(*target),
        }
    }

    /// Whether some pointer other than `pointer` holds a confirmed hover on `target`.
    pub fn hovered_by_other(&self, target: TargetId, pointer: PointerId) -> bool {
        self.records.iter().any(|(p, r)| {
            *p != pointer && matches!(r, Record::Confirmed { target: t } if *t == target)
        })
    }

    /// Start arming. Any previous record for the pointer must have been cancelled.
    pub fn arm(&mut self, target: TargetId, sample: PointerSample, timer: TimerHandle) {
        self.records.insert(
            sample.pointer,
            Record::Arming {
                target,
                timer,
                latest: sample,
            },
        );
    }

    /// Confirm immediately with `sample` (zero settle time).
    pub fn confirm_now(&mut self, target: TargetId, sample: PointerSample) -> PointerSample {
        self.records
            .insert(sample.pointer, Record::Confirmed { target });
        PointerSample {
            from_hover_start: true,
            ..sample
        }
    }

    /// Remember the latest sample of an arming pointer. Returns false otherwise.
    pub fn track(&mut self, sample: PointerSample) -> bool {
        match self.records.get_mut(&sample.pointer) {
            Some(Record::Arming { latest, .. }) => {
                *latest = sample;
                true
            }
            _ => false,
        }
    }

    /// Settle timer `handle` fired at `now`.
    ///
    /// Returns the hovered target and the hover-start sample, built from the
    /// latest tracked position. A stale handle returns `None`.
    pub fn settle(
        &mut self,
        pointer: PointerId,
        handle: TimerHandle,
        now: u64,
    ) -> Option<(TargetId, PointerSample)> {
        let Some(Record::Arming {
            target,
            timer,
            latest,
        }) = self.records.get(&pointer).copied()
        else {
            return None;
        };
        if timer != handle {
            return None;
        }
        self.records.insert(pointer, Record::Confirmed { target });
        Some((
            target,
            PointerSample {
                timestamp: now.max(latest.timestamp),
                from_hover_start: true,
                ..latest
            },
        ))
    }

    /// Return `pointer` to idle.
    pub fn cancel(&mut self, pointer: PointerId) -> HoverCancel {
        match self.records.remove(&pointer) {
            None => HoverCancel::default(),
            Some(Record::Arming { timer, .. }) => HoverCancel {
                timer: Some(timer),
                confirmed_on: None,
            },
            Some(Record::Confirmed { target }) => HoverCancel {
                timer: None,
                confirmed_on: Some(target),
            },
        }
    }
}
