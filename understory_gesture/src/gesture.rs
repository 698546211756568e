// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture definitions, behaviors, and recognition runtime state.
//!
//! A [`GestureDefinition`] is immutable once registered. Its behavior (what
//! the gesture does when it starts or ends) lives outside the engine and is
//! reached through the [`GestureBehavior`] trait. The engine keeps the
//! recognition bookkeeping for each definition in [`GestureRuntime`].

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Point;

use crate::permutation::{Permutation, PointerClass};
use crate::scheduler::TimerHandle;
use crate::types::{PointerId, TargetId};

/// A pointer taking part in a gesture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActivePointer {
    /// Pointer identity.
    pub pointer: PointerId,
    /// Class the matched permutation counted this pointer under.
    pub class: PointerClass,
    /// Position among pointers of the same class, in arrival order.
    pub ordinal: u16,
    /// Last known position.
    pub position: Point,
    /// Time the pointer went down (or its hover was confirmed).
    pub since: u64,
    /// True for a confirmed hover rather than a contact.
    pub hovering: bool,
}

/// View of a gesture handed to its behavior.
#[derive(Debug)]
pub struct GestureContext<'a> {
    name: &'a str,
    target: TargetId,
    pointers: &'a [ActivePointer],
    now: u64,
    ink: Option<PointerId>,
}

impl<'a> GestureContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        target: TargetId,
        pointers: &'a [ActivePointer],
        now: u64,
    ) -> Self {
        Self {
            name,
            target,
            pointers,
            now,
            ink: None,
        }
    }

    /// Registered (possibly uniquified) gesture name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Target the gesture is registered on.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Pointers taking part in the gesture, in arrival order.
    pub fn pointers(&self) -> &[ActivePointer] {
        self.pointers
    }

    /// Engine time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// The pointer with the given class and ordinal, e.g. the second touch.
    pub fn pointer(&self, class: PointerClass, ordinal: u16) -> Option<&ActivePointer> {
        self.pointers
            .iter()
            .find(|p| p.class == class && p.ordinal == ordinal)
    }

    /// Forward subsequent moves and the final lift of `pointer` to the ink collaborator.
    pub fn drive_ink(&mut self, pointer: PointerId) {
        self.ink = Some(pointer);
    }

    pub(crate) fn ink_request(&self) -> Option<PointerId> {
        self.ink
    }
}

/// What a gesture does. Implemented by the host.
///
/// All methods have no-op defaults, and `conditional` accepts by default.
pub trait GestureBehavior {
    /// Extra predicate evaluated during matching, after pointer counts match.
    fn conditional(&self, _cx: &GestureContext<'_>) -> bool {
        true
    }

    /// The gesture was recognized. Pointer capture is requested after this returns.
    fn started(&mut self, _cx: &mut GestureContext<'_>) {}

    /// A pointer of the running gesture was lifted.
    fn ended(&mut self, _cx: &mut GestureContext<'_>, _lifted: PointerId) {}

    /// The gesture's completion grace period ran out before it finished.
    fn cancelled(&mut self, _cx: &mut GestureContext<'_>) {}
}

/// A behavior that does nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoBehavior;

impl GestureBehavior for NoBehavior {}

/// Declarative description of a gesture.
pub struct GestureDefinition {
    /// Unique name. A trailing `*` asks the registry to append a unique suffix.
    pub name: String,
    /// Logical group used by [`GestureRegistry::set_group_enabled`](crate::registry::GestureRegistry::set_group_enabled).
    /// Defaults to the name without any unique suffix.
    pub group: Option<String>,
    /// Target element.
    pub target: Option<TargetId>,
    /// Accepted pointer-type permutations, as strings such as `touch:2+pen`.
    pub pointer_types: Vec<String>,
    /// How long to collect pointers before attempting recognition.
    pub recognition_timeout_ms: u64,
    /// Grace period after recognition; also the upper bound for a quick tap.
    pub completion_timeout_ms: u64,
    /// Refuse to start while any other gesture is active on the target.
    pub is_exclusive: bool,
    /// Occurrences needed to recognize, e.g. 2 for a double tap.
    pub repeat_count: u32,
    /// Maximum time between occurrences.
    pub repeat_timeout_ms: u64,
    /// Whether unmatched input may be replayed to ancestors.
    pub allows_event_propagation: bool,
    /// Whether the gesture takes part in matching.
    pub is_enabled: bool,
    /// Host behavior.
    pub behavior: Box<dyn GestureBehavior>,
}

impl core::fmt::Debug for GestureDefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GestureDefinition")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("target", &self.target)
            .field("pointer_types", &self.pointer_types)
            .field("recognition_timeout_ms", &self.recognition_timeout_ms)
            .field("completion_timeout_ms", &self.completion_timeout_ms)
            .field("is_exclusive", &self.is_exclusive)
            .field("repeat_count", &self.repeat_count)
            .field("repeat_timeout_ms", &self.repeat_timeout_ms)
            .field("allows_event_propagation", &self.allows_event_propagation)
            .field("is_enabled", &self.is_enabled)
            .finish_non_exhaustive()
    }
}

impl GestureDefinition {
    /// A single-occurrence gesture on `target` with the given permutations.
    pub fn new(name: impl Into<String>, target: TargetId, pointer_types: &[&str]) -> Self {
        Self {
            name: name.into(),
            group: None,
            target: Some(target),
            pointer_types: pointer_types.iter().map(|s| String::from(*s)).collect(),
            recognition_timeout_ms: 0,
            completion_timeout_ms: 0,
            is_exclusive: false,
            repeat_count: 1,
            repeat_timeout_ms: 0,
            allows_event_propagation: true,
            is_enabled: true,
            behavior: Box::new(NoBehavior),
        }
    }

    /// Set the recognition timeout.
    pub fn recognition_timeout(mut self, ms: u64) -> Self {
        self.recognition_timeout_ms = ms;
        self
    }

    /// Set the completion timeout.
    pub fn completion_timeout(mut self, ms: u64) -> Self {
        self.completion_timeout_ms = ms;
        self
    }

    /// Require `count` occurrences, each within `timeout_ms` of the previous.
    pub fn repeat(mut self, count: u32, timeout_ms: u64) -> Self {
        self.repeat_count = count;
        self.repeat_timeout_ms = timeout_ms;
        self
    }

    /// Mark as exclusive.
    pub fn exclusive(mut self) -> Self {
        self.is_exclusive = true;
        self
    }

    /// Forbid replaying unmatched input to ancestors.
    pub fn without_propagation(mut self) -> Self {
        self.allows_event_propagation = false;
        self
    }

    /// Put the gesture in a logical group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Register disabled.
    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Attach a behavior.
    pub fn behavior(mut self, behavior: impl GestureBehavior + 'static) -> Self {
        self.behavior = Box::new(behavior);
        self
    }
}

/// Mutable recognition state of a registered gesture.
#[derive(Clone, Debug, Default)]
pub struct GestureRuntime {
    /// Pointers of the running instance; empty when inactive.
    pub active_pointers: Vec<ActivePointer>,
    /// Time of the last full recognition.
    pub started_at: Option<u64>,
    /// Time the last instance ended.
    pub ended_at: Option<u64>,
    /// Set when the last instance or repeat sequence was cancelled.
    pub is_cancelled: bool,
    /// Occurrences counted toward `repeat_count`.
    pub repeat_occurrences: u32,
    /// Time of the last counted occurrence.
    pub last_repeat_at: Option<u64>,
    pub(crate) repeat_timer: Option<TimerHandle>,
    // Acquisition window the pending occurrence belongs to.
    pub(crate) repeat_window: Option<(TargetId, u64)>,
}

impl GestureRuntime {
    /// Whether an instance is running.
    pub fn is_active(&self) -> bool {
        !self.active_pointers.is_empty()
    }

    /// Whether a repeat sequence was cancelled with occurrences still pending.
    pub fn is_cancelled_with_pending(&self) -> bool {
        self.is_cancelled && self.repeat_occurrences > 0
    }

    /// Whether `pointer` takes part in the running instance.
    pub fn holds(&self, pointer: PointerId) -> bool {
        self.active_pointers.iter().any(|p| p.pointer == pointer)
    }
}

/// A registered gesture: its definition, parsed permutations, and runtime.
#[derive(Debug)]
pub struct Gesture {
    pub(crate) def: GestureDefinition,
    pub(crate) target: TargetId,
    pub(crate) group: String,
    pub(crate) permutations: Vec<Permutation>,
    pub(crate) runtime: GestureRuntime,
}

impl Gesture {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Logical group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Target element.
    pub fn target(&self) -> TargetId {
        self.target
    }

    /// Definition as registered.
    pub fn definition(&self) -> &GestureDefinition {
        &self.def
    }

    /// Parsed permutations, in declaration order.
    pub fn permutations(&self) -> &[Permutation] {
        &self.permutations
    }

    /// Recognition state.
    pub fn runtime(&self) -> &GestureRuntime {
        &self.runtime
    }

    /// Whether the gesture currently takes part in matching.
    pub fn is_enabled(&self) -> bool {
        self.def.is_enabled
    }

    /// Whether any permutation accepts pointers of `class`.
    pub fn accepts(&self, class: PointerClass) -> bool {
        self.permutations.iter().any(|p| p.accepts(class))
    }

    /// Whether some permutation names `hover` explicitly.
    pub fn wants_hover(&self) -> bool {
        self.permutations
            .iter()
            .any(|p| p.count(PointerClass::Hover) > 0)
    }

    pub(crate) fn check_conditional(&self, pointers: &[ActivePointer], now: u64) -> bool {
        let cx = GestureContext::new(&self.def.name, self.target, pointers, now);
        self.def.behavior.conditional(&cx)
    }

    /// Run `started`. Returns the pointer the behavior asked to drive ink with.
    pub(crate) fn notify_started(&mut self, now: u64) -> Option<PointerId> {
        let mut cx =
            GestureContext::new(&self.def.name, self.target, &self.runtime.active_pointers, now);
        self.def.behavior.started(&mut cx);
        cx.ink_request()
    }

    pub(crate) fn notify_ended(&mut self, now: u64, lifted: PointerId) {
        let mut cx =
            GestureContext::new(&self.def.name, self.target, &self.runtime.active_pointers, now);
        self.def.behavior.ended(&mut cx, lifted);
    }

    pub(crate) fn notify_cancelled(&mut self, now: u64) {
        let mut cx =
            GestureContext::new(&self.def.name, self.target, &self.runtime.active_pointers, now);
        self.def.behavior.cancelled(&mut cx);
    }
}
