// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event postponement and propagation relay.
//!
//! ## Overview
//!
//! While a target is undecided, its events are held in a [`PostponedQueue`]
//! instead of bubbling. If recognition fails and propagation is allowed, the
//! queue is replayed: every event is cloned, retargeted to the target's parent
//! and handed back to the host in original order. At a root surface the clones
//! are addressed to the surface itself and flagged with
//! [`PointerEvent::terminal_replay`] so the engine does not postpone them again.
//!
//! A queue holding a synthesized hover start is never replayed; it is discarded.
//!
//! Replay works on a snapshot taken before any clone is handed out. The host
//! feeds the clones back into the coordinator, and the leading down may open
//! a new window on the parent and fill that target's queue.

use alloc::vec::Vec;

use crate::error::EngineError;
use crate::event::PointerEvent;
use crate::types::{ParentLookup, PointerId, TargetId};

/// Result of replaying a queue.
#[derive(Clone, Debug, PartialEq)]
pub enum Replay {
    /// Events cloned for redispatch, in original order, with their destination.
    Redispatch(Vec<(TargetId, PointerEvent)>),
    /// Replay was unsafe or not allowed; this many events were dropped.
    Discarded(usize),
}

/// FIFO of events postponed for one target during one acquisition window.
///
/// When non-empty, the first event is always the contact start that opened the
/// window. Pushing anything else into an empty queue is an engine defect.
#[derive(Clone, Debug)]
pub struct PostponedQueue {
    owner: TargetId,
    window_pointer: Option<PointerId>,
    events: Vec<PointerEvent>,
}

impl PostponedQueue {
    /// Create an empty queue for `owner`.
    pub fn new(owner: TargetId) -> Self {
        Self {
            owner,
            window_pointer: None,
            events: Vec::new(),
        }
    }

    /// Drop everything and start a window opened by `pointer`.
    pub fn reset(&mut self, pointer: PointerId) {
        self.events.clear();
        self.window_pointer = Some(pointer);
    }

    /// Append an event, tagging it with its redispatch age.
    ///
    /// The age is set from the event's timestamp the first time the event is
    /// postponed and kept across replays.
    pub fn push(&mut self, mut event: PointerEvent) -> Result<(), EngineError> {
        if event.target != self.owner {
            return Err(EngineError::TargetMismatch {
                expected: self.owner,
                found: event.target,
            });
        }
        if self.events.is_empty() {
            let opens = event.kind.is_contact_start()
                && Some(event.pointer()) == self.window_pointer;
            if !opens {
                return Err(EngineError::QueueInvariant {
                    target: self.owner,
                    found: Some(event.kind),
                });
            }
        }
        event.redispatch_age.get_or_insert(event.sample.timestamp);
        self.events.push(event);
        Ok(())
    }

    /// Check that the queue still starts with its window's opening event.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self.events.first() {
            None => Ok(()),
            Some(first)
                if first.kind.is_contact_start()
                    && Some(first.pointer()) == self.window_pointer =>
            {
                Ok(())
            }
            Some(first) => Err(EngineError::QueueInvariant {
                target: self.owner,
                found: Some(first.kind),
            }),
        }
    }

    /// Drop all events. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.events.len();
        self.events.clear();
        n
    }

    /// Postponed events in arrival order.
    pub fn events(&self) -> &[PointerEvent] {
        &self.events
    }

    /// Number of postponed events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is postponed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether a synthesized hover start is queued.
    pub fn contains_hover_start(&self) -> bool {
        self.events.iter().any(PointerEvent::is_hover_start)
    }

    /// Snapshot the queue and clone it for redispatch.
    ///
    /// The queue is left empty either way.
    pub fn replay(&mut self, parents: &impl ParentLookup<TargetId>) -> Result<Replay, EngineError> {
        self.validate()?;
        let snapshot = core::mem::take(&mut self.events);
        if snapshot.iter().any(PointerEvent::is_hover_start) {
            return Ok(Replay::Discarded(snapshot.len()));
        }
        let (to, terminal) = match parents.parent_of(&self.owner) {
            Some(parent) => (parent, false),
            None => (self.owner, true),
        };
        let out = snapshot
            .iter()
            .map(|ev| {
                let mut clone = ev.retargeted(to);
                clone.terminal_replay = terminal;
                (to, clone)
            })
            .collect();
        Ok(Replay::Redispatch(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, PointerSample};
    use crate::target::TargetArena;
    use kurbo::Point;

    fn sample(t: u64) -> PointerSample {
        PointerSample::new(PointerId::touch(1), Point::new(t as f64, 0.0), t)
    }

    #[test]
    fn replays_clones_to_parent_in_order() {
        let mut arena = TargetArena::new();
        let root = arena.insert(None);
        let child = arena.insert(Some(root));
        let mut q = PostponedQueue::new(child);
        q.reset(PointerId::touch(1));
        q.push(PointerEvent::down(child, sample(0))).unwrap();
        q.push(PointerEvent::moved(child, sample(5))).unwrap();
        q.push(PointerEvent::moved(child, sample(9))).unwrap();
        let originals = q.events().to_vec();

        let Replay::Redispatch(mut out) = q.replay(&arena).unwrap() else {
            panic!("expected redispatch");
        };
        assert!(q.is_empty());
        assert_eq!(out.len(), 3);
        let kinds: Vec<EventKind> = out.iter().map(|(_, e)| e.kind).collect();
        assert_eq!(kinds, [EventKind::Down, EventKind::Move, EventKind::Move]);
        assert!(out.iter().all(|(to, e)| *to == root && e.target == root));
        assert!(out.iter().all(|(_, e)| !e.terminal_replay));
        assert_eq!(out[1].1.redispatch_age, Some(5));

        out[0].1.sample.position = Point::new(99.0, 99.0);
        assert_eq!(originals[0].sample.position, Point::new(0.0, 0.0));
        assert_eq!(originals[0].target, child);
    }

    #[test]
    fn root_replay_is_terminal() {
        let mut arena = TargetArena::new();
        let root = arena.insert(None);
        let mut q = PostponedQueue::new(root);
        q.reset(PointerId::touch(1));
        q.push(PointerEvent::down(root, sample(0))).unwrap();
        let Replay::Redispatch(out) = q.replay(&arena).unwrap() else {
            panic!("expected redispatch");
        };
        assert_eq!(out[0].0, root);
        assert!(out[0].1.terminal_replay);
    }

    #[test]
    fn hover_start_queue_is_discarded() {
        let arena = TargetArena::new();
        let t = TargetId(0);
        let mut q = PostponedQueue::new(t);
        q.reset(PointerId::touch(1));
        let mut s = sample(0);
        s.from_hover_start = true;
        q.push(PointerEvent::new(EventKind::HoverStart, t, s)).unwrap();
        q.push(PointerEvent::moved(t, sample(3))).unwrap();
        assert!(q.contains_hover_start());
        assert_eq!(q.replay(&arena), Ok(Replay::Discarded(2)));
        assert!(q.is_empty());
    }

    #[test]
    fn redispatch_age_survives_requeue() {
        let t = TargetId(0);
        let mut q = PostponedQueue::new(t);
        q.reset(PointerId::touch(1));
        let mut ev = PointerEvent::down(t, sample(40));
        ev.redispatch_age = Some(7);
        q.push(ev).unwrap();
        assert_eq!(q.events()[0].redispatch_age, Some(7));
    }

    #[test]
    fn queue_must_start_with_window_opener() {
        let t = TargetId(0);
        let mut q = PostponedQueue::new(t);
        q.reset(PointerId::touch(1));
        assert_eq!(
            q.push(PointerEvent::moved(t, sample(0))),
            Err(EngineError::QueueInvariant {
                target: t,
                found: Some(EventKind::Move),
            })
        );
        let other = PointerSample::new(PointerId::touch(2), Point::ZERO, 0);
        assert!(q.push(PointerEvent::down(t, other)).is_err());
        assert_eq!(
            q.push(PointerEvent::down(TargetId(4), sample(0))),
            Err(EngineError::TargetMismatch {
                expected: t,
                found: TargetId(4),
            })
        );
        assert!(q.is_empty());
    }
}
