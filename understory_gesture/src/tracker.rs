// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-target pointer bookkeeping.
//!
//! Three independent maps are kept per target, each keyed by pointer:
//!
//! - *down*: pointers currently in contact,
//! - *hover*: pointers with a confirmed hover,
//! - *latest move*: the last known sample of every pointer seen on the target.
//!
//! A pointer is never in both the down and hover maps of one target.
//! Down and hover groups are dropped as soon as they become empty; latest-move
//! groups stay behind as empty maps.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::event::PointerSample;
use crate::gesture::Gesture;
use crate::permutation::{PointerClass, PointerCounts};
use crate::types::{PointerId, TargetId};

type Group = BTreeMap<PointerId, PointerSample>;

/// A tracked pointer on one target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrackedPointer {
    /// The down (or hover-confirm) sample.
    pub start: PointerSample,
    /// Latest known sample.
    pub latest: PointerSample,
    /// True for a confirmed hover.
    pub hovering: bool,
}

impl TrackedPointer {
    /// Class this pointer counts under.
    pub fn class(&self) -> PointerClass {
        if self.hovering {
            PointerClass::Hover
        } else {
            PointerClass::of_contact(self.start.pointer.kind)
        }
    }
}

/// Active pointer sets for every target.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    down: BTreeMap<TargetId, Group>,
    hover: BTreeMap<TargetId, Group>,
    latest_move: BTreeMap<TargetId, Group>,
}

impl PointerTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contact. Any hover of the same pointer on `target` is dropped.
    pub fn insert_down(&mut self, target: TargetId, sample: PointerSample) {
        Self::remove_from(&mut self.hover, target, sample.pointer);
        self.down
            .entry(target)
            .or_default()
            .insert(sample.pointer, sample);
        self.record_move(target, sample);
    }

    /// Record a confirmed hover. Returns false if the pointer is in contact on `target`.
    pub fn insert_hover(&mut self, target: TargetId, sample: PointerSample) -> bool {
        if self.is_down_on(target, sample.pointer) {
            return false;
        }
        self.hover
            .entry(target)
            .or_default()
            .insert(sample.pointer, sample);
        self.record_move(target, sample);
        true
    }

    /// Remember the latest sample of a pointer on `target`.
    pub fn record_move(&mut self, target: TargetId, sample: PointerSample) {
        self.latest_move
            .entry(target)
            .or_default()
            .insert(sample.pointer, sample);
    }

    /// Remove `pointer` from every map of every target.
    ///
    /// Returns the targets that held it in their down or hover maps.
    pub fn remove_everywhere(&mut self, pointer: PointerId) -> Vec<TargetId> {
        let mut affected = self.targets_holding(pointer);
        for target in &affected {
            Self::remove_from(&mut self.down, *target, pointer);
            Self::remove_from(&mut self.hover, *target, pointer);
        }
        for group in self.latest_move.values_mut() {
            group.remove(&pointer);
        }
        affected.dedup();
        affected
    }

    /// Targets whose down or hover maps contain `pointer`, in handle order.
    pub fn targets_holding(&self, pointer: PointerId) -> Vec<TargetId> {
        let mut out: Vec<TargetId> = self
            .down
            .iter()
            .chain(self.hover.iter())
            .filter(|(_, g)| g.contains_key(&pointer))
            .map(|(t, _)| *t)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Whether `pointer` is in contact on `target`.
    pub fn is_down_on(&self, target: TargetId, pointer: PointerId) -> bool {
        self.down
            .get(&target)
            .is_some_and(|g| g.contains_key(&pointer))
    }

    /// Whether `pointer` hovers `target`.
    pub fn is_hovering_on(&self, target: TargetId, pointer: PointerId) -> bool {
        self.hover
            .get(&target)
            .is_some_and(|g| g.contains_key(&pointer))
    }

    /// The target `pointer` hovers, if any.
    pub fn hover_target_of(&self, pointer: PointerId) -> Option<TargetId> {
        self.hover
            .iter()
            .find(|(_, g)| g.contains_key(&pointer))
            .map(|(t, _)| *t)
    }

    /// Whether any target has `pointer` in contact.
    pub fn is_down_anywhere(&self, pointer: PointerId) -> bool {
        self.down.values().any(|g| g.contains_key(&pointer))
    }

    /// Number of hovering pointers on `target`.
    pub fn hover_count(&self, target: TargetId) -> usize {
        self.hover.get(&target).map_or(0, BTreeMap::len)
    }

    /// Whether `target` has any pointer in contact or hovering.
    pub fn has_pointers(&self, target: TargetId) -> bool {
        self.down.contains_key(&target) || self.hover.contains_key(&target)
    }

    /// Whether a down group exists for `target`.
    pub fn has_down_group(&self, target: TargetId) -> bool {
        self.down.contains_key(&target)
    }

    /// Whether a hover group exists for `target`.
    pub fn has_hover_group(&self, target: TargetId) -> bool {
        self.hover.contains_key(&target)
    }

    /// Whether a latest-move group exists for `target`.
    pub fn has_move_group(&self, target: TargetId) -> bool {
        self.latest_move.contains_key(&target)
    }

    /// Latest sample of `pointer` on `target`.
    pub fn latest(&self, target: TargetId, pointer: PointerId) -> Option<&PointerSample> {
        self.latest_move.get(&target)?.get(&pointer)
    }

    /// Pointers in contact on `target`.
    pub fn down_pointers(&self, target: TargetId) -> impl Iterator<Item = PointerId> + '_ {
        self.down.get(&target).into_iter().flat_map(|g| g.keys().copied())
    }

    /// Pointers hovering `target`.
    pub fn hover_pointers(&self, target: TargetId) -> impl Iterator<Item = PointerId> + '_ {
        self.hover.get(&target).into_iter().flat_map(|g| g.keys().copied())
    }

    /// Every tracked pointer on `target`, ordered by arrival.
    pub fn tracked(&self, target: TargetId) -> Vec<TrackedPointer> {
        let mut out = Vec::new();
        for (group, hovering) in [(self.down.get(&target), false), (self.hover.get(&target), true)] {
            for (pointer, start) in group.into_iter().flatten() {
                let latest = self.latest(target, *pointer).copied().unwrap_or(*start);
                out.push(TrackedPointer {
                    start: *start,
                    latest,
                    hovering,
                });
            }
        }
        out.sort_by_key(|p| (p.start.timestamp, p.start.pointer));
        out
    }

    /// Active pointer counts per class on `target`.
    pub fn counts(&self, target: TargetId) -> PointerCounts {
        let mut counts = PointerCounts::default();
        for p in self.tracked(target) {
            counts.add(p.class());
        }
        counts
    }

    fn remove_from(map: &mut BTreeMap<TargetId, Group>, target: TargetId, pointer: PointerId) {
        if let Some(group) = map.get_mut(&target) {
            group.remove(&pointer);
            if group.is_empty() {
                map.remove(&target);
            }
        }
    }
}

/// Effective recognition timeout for a pointer of `class` arriving on a target.
///
/// The maximum recognition timeout among enabled `gestures` that accept
/// `class`, `any`, or (for a hover-capable pointer) `hover`. `None` when no
/// gesture cares about the pointer.
pub fn effective_timeout<'a>(
    gestures: impl IntoIterator<Item = &'a Gesture>,
    class: PointerClass,
    hover_capable: bool,
) -> Option<u64> {
    gestures
        .into_iter()
        .filter(|g| g.is_enabled())
        .filter(|g| g.accepts(class) || (hover_capable && g.accepts(PointerClass::Hover)))
        .map(|g| g.definition().recognition_timeout_ms)
        .max()
}
