// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer event records.
//!
//! [`PointerEvent`] is the only event type the engine stores. It is a plain
//! value: cloning produces an independent copy, so postponed events can be
//! replayed to ancestors without sharing state with the originals.

use kurbo::Point;

use crate::types::{PointerButtons, PointerId, TargetId};

/// Kind of a pointer notification.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventKind {
    /// Pointer made contact (or a button was pressed).
    Down,
    /// Pointer moved, in contact or not.
    Move,
    /// Pointer lifted.
    Up,
    /// Platform cancelled the pointer.
    Cancel,
    /// Pointer entered the element's bounds.
    Enter,
    /// Pointer left the element's bounds.
    Leave,
    /// Synthesized by the hover detector once a hover settles.
    HoverStart,
}

impl EventKind {
    /// Whether this kind opens an acquisition window.
    pub const fn is_contact_start(self) -> bool {
        matches!(self, Self::Down | Self::HoverStart)
    }

    /// Whether this kind terminates a pointer.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }
}

/// A single pointer sample as reported by the input layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerSample {
    /// Stable pointer identity (includes the pointer type).
    pub pointer: PointerId,
    /// Pressed buttons.
    pub buttons: PointerButtons,
    /// Position in surface coordinates.
    pub position: Point,
    /// Milliseconds on the host clock.
    pub timestamp: u64,
    /// True when this sample was synthesized from a confirmed hover.
    pub from_hover_start: bool,
}

impl PointerSample {
    /// Create a sample with no pressed buttons.
    pub fn new(pointer: PointerId, position: Point, timestamp: u64) -> Self {
        Self {
            pointer,
            buttons: PointerButtons::empty(),
            position,
            timestamp,
            from_hover_start: false,
        }
    }

    /// Set the pressed buttons.
    pub fn with_buttons(mut self, buttons: PointerButtons) -> Self {
        self.buttons = buttons;
        self
    }
}

/// A pointer event addressed to one target.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Notification kind.
    pub kind: EventKind,
    /// Element the event is currently delivered to.
    pub target: TargetId,
    /// The sample carried by the event.
    pub sample: PointerSample,
    /// Time the event was first postponed; set once and kept across replays.
    pub redispatch_age: Option<u64>,
    /// Set on events replayed back to a root surface; the engine ignores them.
    pub terminal_replay: bool,
}

impl PointerEvent {
    /// Layout version of this record. Bumped whenever fields change meaning.
    pub const RECORD_VERSION: u16 = 1;

    /// Create an event.
    pub fn new(kind: EventKind, target: TargetId, sample: PointerSample) -> Self {
        Self {
            kind,
            target,
            sample,
            redispatch_age: None,
            terminal_replay: false,
        }
    }

    /// Contact start.
    ///
    /// The primary button is added when the sample carries no buttons.
    pub fn down(target: TargetId, mut sample: PointerSample) -> Self {
        if sample.buttons.is_empty() {
            sample.buttons = PointerButtons::PRIMARY;
        }
        Self::new(EventKind::Down, target, sample)
    }

    /// Movement.
    pub fn moved(target: TargetId, sample: PointerSample) -> Self {
        Self::new(EventKind::Move, target, sample)
    }

    /// Contact end.
    pub fn up(target: TargetId, mut sample: PointerSample) -> Self {
        sample.buttons = PointerButtons::empty();
        Self::new(EventKind::Up, target, sample)
    }

    /// Platform cancellation.
    pub fn cancel(target: TargetId, sample: PointerSample) -> Self {
        Self::new(EventKind::Cancel, target, sample)
    }

    /// Pointer entered the target.
    pub fn enter(target: TargetId, sample: PointerSample) -> Self {
        Self::new(EventKind::Enter, target, sample)
    }

    /// Pointer left the target.
    pub fn leave(target: TargetId, sample: PointerSample) -> Self {
        Self::new(EventKind::Leave, target, sample)
    }

    /// The pointer this event belongs to.
    pub fn pointer(&self) -> PointerId {
        self.sample.pointer
    }

    /// Whether this is a synthesized hover start.
    pub fn is_hover_start(&self) -> bool {
        self.kind == EventKind::HoverStart || self.sample.from_hover_start
    }

    /// Clone this event for delivery to another target.
    pub(crate) fn retargeted(&self, target: TargetId) -> Self {
        let mut ev = self.clone();
        ev.target = target;
        ev
    }
}
