// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinator: the engine's single owner of state.
//!
//! ## Overview
//!
//! A [`Coordinator`] owns the target arena, the gesture registry, the pointer
//! tracker, the hover detector, the postponed queues, and the capture table of
//! one host surface. Hosts create one coordinator per surface; coordinators
//! share nothing.
//!
//! The host drives it with two calls:
//!
//! - [`Coordinator::handle`] for every inbound pointer notification. The
//!   returned [`Outcome`] tells the host dispatcher whether to keep bubbling
//!   the raw event.
//! - [`Coordinator::fire_timer`] when a timer scheduled through the
//!   [`Scheduler`] expires. With a [`VirtualScheduler`],
//!   [`Coordinator::advance_to`] fires every due timer.
//!
//! Everything the host has to do in response (capture pointers, redispatch
//! replayed events, forward ink, attach listeners) is queued as an [`Effect`]
//! and collected with [`Coordinator::drain_effects`]. Replayed events must be
//! fed back into [`Coordinator::handle`].
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::Point;
//! use understory_gesture::coordinator::{Coordinator, Effect};
//! use understory_gesture::event::{PointerEvent, PointerSample};
//! use understory_gesture::gesture::GestureDefinition;
//! use understory_gesture::scheduler::VirtualScheduler;
//! use understory_gesture::types::{Outcome, PointerId};
//!
//! let mut c = Coordinator::new(VirtualScheduler::new());
//! let surface = c.add_surface();
//! c.register(GestureDefinition::new("tap", surface, &["touch"])).unwrap();
//!
//! let finger = PointerSample::new(PointerId::touch(1), Point::new(5.0, 5.0), 0);
//! assert_eq!(c.handle(PointerEvent::down(surface, finger)).unwrap(), Outcome::StopAndConsume);
//! c.advance_to(0).unwrap();
//! assert_eq!(c.active_gesture_count(surface), 1);
//! assert!(c.drain_effects().contains(&Effect::Capture { target: surface, pointer: finger.pointer }));
//! ```

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::config::{EngineConfig, NoOverrides, SettingsLookup, hover_timeout_for};
use crate::diag::diag;
use crate::error::{EngineError, RegistrationError};
use crate::event::{EventKind, PointerEvent, PointerSample};
use crate::gesture::{ActivePointer, Gesture, GestureDefinition};
use crate::hover::{HoverDetector, HoverPhase};
use crate::matcher::{MatchOutcome, MatchRequest, find_match};
use crate::permutation::PointerClass;
use crate::registry::GestureRegistry;
use crate::relay::{PostponedQueue, Replay};
use crate::scheduler::{Scheduler, TimerHandle, TimerToken, VirtualScheduler};
use crate::target::{TargetArena, TargetPhase, TargetState, Transition};
use crate::tracker::{PointerTracker, effective_timeout};
use crate::types::{GestureId, Outcome, PointerId, TargetId};

/// A side effect the host must carry out.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Capture `pointer` to `target`.
    Capture {
        /// Capturing element.
        target: TargetId,
        /// Captured pointer.
        pointer: PointerId,
    },
    /// Release a capture requested earlier.
    ReleaseCapture {
        /// Capturing element.
        target: TargetId,
        /// Captured pointer.
        pointer: PointerId,
    },
    /// Deliver a replayed event to `to` and feed it back into [`Coordinator::handle`].
    Redispatch {
        /// Destination element.
        to: TargetId,
        /// The cloned event.
        event: PointerEvent,
    },
    /// Forward a move of the ink-driving pointer to the ink collaborator.
    InkMove(PointerEvent),
    /// Forward the lift of the ink-driving pointer; the stroke is finished.
    InkUp(PointerEvent),
    /// Start routing pointer events for this element to the coordinator.
    AttachListeners(TargetId),
    /// Stop routing pointer events for this element; it has no gestures left.
    DetachListeners(TargetId),
}

/// Gesture engine for one host surface.
#[derive(Debug)]
pub struct Coordinator<S: Scheduler, L: SettingsLookup = NoOverrides> {
    config: EngineConfig,
    scheduler: S,
    settings: L,
    targets: TargetArena,
    registry: GestureRegistry,
    tracker: PointerTracker,
    hover: HoverDetector,
    queues: BTreeMap<TargetId, PostponedQueue>,
    captures: BTreeMap<PointerId, (TargetId, GestureId)>,
    ink: Option<(PointerId, GestureId)>,
    effects: Vec<Effect>,
    now: u64,
}

impl<S: Scheduler> Coordinator<S, NoOverrides> {
    /// Create a coordinator with the default configuration and no settings overrides.
    pub fn new(scheduler: S) -> Self {
        Self::with_settings(scheduler, NoOverrides, EngineConfig::default())
    }
}

impl<S: Scheduler, L: SettingsLookup> Coordinator<S, L> {
    /// Create a coordinator with explicit settings and configuration.
    pub fn with_settings(scheduler: S, settings: L, config: EngineConfig) -> Self {
        let mut registry = GestureRegistry::new();
        registry.diagnostics = config.diagnostics;
        Self {
            config,
            scheduler,
            settings,
            targets: TargetArena::new(),
            registry,
            tracker: PointerTracker::new(),
            hover: HoverDetector::new(),
            queues: BTreeMap::new(),
            captures: BTreeMap::new(),
            ink: None,
            effects: Vec::new(),
            now: 0,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Settings collaborator.
    pub fn settings_mut(&mut self) -> &mut L {
        &mut self.settings
    }

    /// Timer scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Latest engine time seen, in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Register a root surface.
    pub fn add_surface(&mut self) -> TargetId {
        self.targets.insert(None)
    }

    /// Register an element below `parent`.
    pub fn add_target(&mut self, parent: TargetId) -> Result<TargetId, EngineError> {
        if !self.targets.contains(parent) {
            return Err(EngineError::UnknownTarget(parent));
        }
        Ok(self.targets.insert(Some(parent)))
    }

    /// Recognition state of `target`.
    pub fn target_state(&self, target: TargetId) -> Option<&TargetState> {
        self.targets.state(target)
    }

    /// Pointer bookkeeping.
    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// Hover state.
    pub fn hover(&self) -> &HoverDetector {
        &self.hover
    }

    /// Gesture registry.
    pub fn registry(&self) -> &GestureRegistry {
        &self.registry
    }

    /// Look up a gesture by id.
    pub fn gesture(&self, id: GestureId) -> Option<&Gesture> {
        self.registry.get(id)
    }

    /// Look up a gesture by registered name.
    pub fn gesture_by_name(&self, name: &str) -> Option<&Gesture> {
        self.registry.get(self.registry.id_of(name)?)
    }

    /// Events currently postponed for `target`.
    pub fn postponed(&self, target: TargetId) -> &[PointerEvent] {
        self.queues.get(&target).map_or(&[], PostponedQueue::events)
    }

    /// Gesture holding the capture of `pointer`.
    pub fn capture_owner(&self, pointer: PointerId) -> Option<GestureId> {
        self.captures.get(&pointer).map(|(_, id)| *id)
    }

    /// Number of running gestures on `target`.
    pub fn active_gesture_count(&self, target: TargetId) -> usize {
        self.registry.active_count(target)
    }

    /// Take all queued effects.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        core::mem::take(&mut self.effects)
    }

    /// Register a gesture.
    ///
    /// Registration order decides priority. A repeat-count gesture must be
    /// registered before simpler gestures it competes with; see
    /// [`GestureRegistry::repeat_order_conflicts`].
    pub fn register(&mut self, def: GestureDefinition) -> Result<GestureId, RegistrationError> {
        let target = def.target;
        let was_listening = target.is_some_and(|t| self.registry.has_gestures(t));
        let targets = &self.targets;
        let id = self.registry.register(def, |t| targets.contains(t))?;
        if let Some(t) = target {
            if !was_listening {
                self.effects.push(Effect::AttachListeners(t));
            }
        }
        Ok(id)
    }

    /// Remove a gesture by name.
    ///
    /// Its timers are cancelled and its captures released. Removing the last
    /// gesture of a target emits [`Effect::DetachListeners`].
    pub fn remove(&mut self, name: &str) -> Result<(), RegistrationError> {
        let id = self
            .registry
            .id_of(name)
            .ok_or_else(|| RegistrationError::UnknownGesture(name.into()))?;
        if let Some(h) = self
            .registry
            .get_mut(id)
            .and_then(|g| g.runtime.repeat_timer.take())
        {
            self.scheduler.cancel(h);
        }
        self.release_captures_of(id);
        if self.ink.is_some_and(|(_, g)| g == id) {
            self.ink = None;
        }
        let gesture = self.registry.remove(name)?;
        let target = gesture.target;
        if let Ok(state) = self.targets.state_mut(target) {
            if state.completion_gesture == Some(id) && state.is_awaiting_completion() {
                if let Some(h) = state.completion_timer.take() {
                    self.scheduler.cancel(h);
                }
                if state.apply(target, Transition::Complete).is_err() {
                    diag!(self.config.diagnostics, STATE, %target, "completion already settled");
                }
                if let Some(q) = self.queues.get_mut(&target) {
                    q.clear();
                }
            }
            if state.pending_repeat == Some(id) {
                state.pending_repeat = None;
                if let Some(q) = self.queues.get_mut(&target) {
                    q.clear();
                }
            }
        }
        if !self.registry.has_gestures(target) {
            self.effects.push(Effect::DetachListeners(target));
        }
        Ok(())
    }

    /// Enable or disable one gesture. Returns false for a stale id.
    pub fn set_enabled(&mut self, id: GestureId, enabled: bool) -> bool {
        self.registry.set_enabled(id, enabled)
    }

    /// Enable or disable every gesture of a logical group.
    pub fn set_group_enabled(&mut self, group: &str, enabled: bool) -> usize {
        self.registry.set_group_enabled(group, enabled)
    }

    /// Process one inbound pointer notification.
    pub fn handle(&mut self, mut event: PointerEvent) -> Result<Outcome, EngineError> {
        if !self.targets.contains(event.target) {
            return Err(EngineError::UnknownTarget(event.target));
        }
        if event.terminal_replay {
            return Ok(Outcome::Continue);
        }
        self.now = self.now.max(event.sample.timestamp);
        event.sample.timestamp = self.now;
        match event.kind {
            EventKind::Down => self.on_down(event),
            EventKind::HoverStart => self.on_contact_start(event),
            EventKind::Move => self.on_move(event),
            EventKind::Up | EventKind::Cancel => self.on_terminal(event),
            EventKind::Enter => self.on_enter(event),
            EventKind::Leave => self.on_leave(event),
        }
    }

    /// A timer scheduled by this coordinator expired at `now`.
    ///
    /// Stale timers (superseded, or whose owner moved on) are ignored.
    pub fn fire_timer(
        &mut self,
        handle: TimerHandle,
        token: TimerToken,
        now: u64,
    ) -> Result<(), EngineError> {
        self.now = self.now.max(now);
        match token {
            TimerToken::Recognize(t) => {
                let state = self.targets.state_mut(t)?;
                if state.recognize_timer == Some(handle) && state.is_acquiring() {
                    state.recognize_timer = None;
                    self.recognize(t, None)?;
                }
            }
            TimerToken::Completion(t) => {
                let state = self.targets.state_mut(t)?;
                if state.completion_timer == Some(handle) && state.is_awaiting_completion() {
                    state.completion_timer = None;
                    self.expire_completion(t)?;
                }
            }
            TimerToken::Repeat(id) => self.expire_repeat(id, handle)?,
            TimerToken::HoverSettle(pointer) => {
                if let Some((t, sample)) = self.hover.settle(pointer, handle, self.now) {
                    diag!(self.config.diagnostics, HOVER, %pointer, %t, "hover confirmed");
                    self.on_contact_start(PointerEvent::new(EventKind::HoverStart, t, sample))?;
                }
            }
            TimerToken::Recheck(t) => {
                let state = self.targets.state_mut(t)?;
                if state.recheck_timer == Some(handle) {
                    state.recheck_timer = None;
                    self.recheck(t)?;
                }
            }
        }
        Ok(())
    }

    fn on_down(&mut self, event: PointerEvent) -> Result<Outcome, EngineError> {
        let pointer = event.pointer();
        if self.tracker.is_down_on(event.target, pointer) {
            diag!(self.config.diagnostics, TRACKER, %pointer, "down without up; synthesizing up");
            self.on_terminal(PointerEvent::up(event.target, event.sample))?;
        }
        let cancel = self.hover.cancel(pointer);
        if let Some(h) = cancel.timer {
            self.scheduler.cancel(h);
            diag!(self.config.diagnostics, HOVER, %pointer, "contact cancelled hover arming");
        }
        if let Some(t) = cancel.confirmed_on {
            diag!(self.config.diagnostics, HOVER, %pointer, %t, "contact ended hover");
            let mut sample = event.sample;
            sample.buttons = crate::types::PointerButtons::empty();
            self.on_terminal(PointerEvent::leave(t, sample))?;
        }
        self.on_contact_start(event)
    }

    /// Record a down or hover start and open or extend the target's window.
    fn on_contact_start(&mut self, event: PointerEvent) -> Result<Outcome, EngineError> {
        let target = event.target;
        let pointer = event.pointer();
        let hovering = event.kind == EventKind::HoverStart;
        let class = if hovering {
            PointerClass::Hover
        } else {
            PointerClass::of_contact(pointer.kind)
        };
        let Some(timeout) = effective_timeout(
            self.registry.on_target(target),
            class,
            pointer.kind.supports_hover(),
        ) else {
            diag!(self.config.diagnostics, TRACKER, %pointer, %target, "no gesture accepts pointer");
            if !self.registry.has_gestures(target) {
                return Ok(Outcome::Continue);
            }
            // Still counted, so permutations that leave it unaccounted fail.
            self.track_contact(target, hovering, event.sample);
            if !self.targets.state(target).is_some_and(TargetState::is_postponing) {
                return Ok(Outcome::Continue);
            }
            queue_for(&mut self.queues, target).push(event)?;
            return Ok(Outcome::StopAndConsume);
        };

        let state = self.targets.state_mut(target)?;
        let opening = !state.is_acquiring() && !state.is_awaiting_completion();
        if opening {
            if let Some(h) = state.recheck_timer.take() {
                self.scheduler.cancel(h);
            }
            state.apply(target, Transition::OpenWindow)?;
            state.window_started_at = event.redispatch_age.unwrap_or(event.sample.timestamp);
            state.window_pointer = Some(pointer);
            queue_for(&mut self.queues, target).reset(pointer);
            diag!(self.config.diagnostics, STATE, %target, %pointer, timeout, "window opened");
        }

        self.track_contact(target, hovering, event.sample);
        queue_for(&mut self.queues, target).push(event)?;

        if opening {
            let h = self
                .scheduler
                .schedule_once(self.now, timeout, TimerToken::Recognize(target));
            self.targets.state_mut(target)?.recognize_timer = Some(h);
        }
        Ok(Outcome::StopAndConsume)
    }

    fn track_contact(&mut self, target: TargetId, hovering: bool, sample: PointerSample) {
        if !hovering {
            self.tracker.insert_down(target, sample);
        } else if !self.tracker.insert_hover(target, sample) {
            diag!(self.config.diagnostics, TRACKER, pointer = %sample.pointer, "hover start for a pointer in contact");
        }
    }

    fn on_move(&mut self, event: PointerEvent) -> Result<Outcome, EngineError> {
        let target = event.target;
        let pointer = event.pointer();
        if event.sample.buttons.is_empty()
            && pointer.kind.supports_hover()
            && self.tracker.is_down_anywhere(pointer)
        {
            diag!(self.config.diagnostics, TRACKER, %pointer, "buttons released without up; synthesizing up");
            return self.on_terminal(PointerEvent::up(target, event.sample));
        }
        if self.hover.track(event.sample) {
            return Ok(Outcome::Continue);
        }
        if self.registry.has_gestures(target) || self.tracker.has_pointers(target) {
            self.tracker.record_move(target, event.sample);
        }
        if self.ink.is_some_and(|(p, _)| p == pointer) {
            self.effects.push(Effect::InkMove(event.clone()));
        }

        let state = self.targets.state_mut(target)?;
        if !state.is_postponing() {
            return Ok(Outcome::Continue);
        }
        // Only the completing gesture's own pointers keep reaching peer listeners.
        let in_gesture = state.is_awaiting_completion()
            && state
                .completion_gesture
                .and_then(|id| self.registry.get(id))
                .is_some_and(|g| g.runtime.holds(pointer));
        let outcome = if in_gesture {
            Outcome::Stop
        } else {
            Outcome::StopAndConsume
        };
        queue_for(&mut self.queues, target).push(event)?;
        Ok(outcome)
    }

    /// Up, cancel, or the leave of a confirmed hover.
    fn on_terminal(&mut self, event: PointerEvent) -> Result<Outcome, EngineError> {
        let pointer = event.pointer();
        let holders = self.tracker.targets_holding(pointer);
        let mut outcome = Outcome::Continue;
        for &t in &holders {
            let postponing = self.targets.state(t).is_some_and(TargetState::is_postponing);
            if postponing {
                queue_for(&mut self.queues, t).push(event.retargeted(t))?;
                if t == event.target {
                    outcome = Outcome::StopAndConsume;
                }
            }
        }
        if self.captures.contains_key(&pointer) {
            outcome = Outcome::StopAndConsume;
        }
        self.remove_pointer(&event, &holders)?;
        Ok(outcome)
    }

    fn remove_pointer(&mut self, event: &PointerEvent, holders: &[TargetId]) -> Result<(), EngineError> {
        let pointer = event.pointer();
        for &t in holders {
            let state = self.targets.state_mut(t)?;
            if state.is_acquiring()
                && !state.has_recognition_run()
                && state.window_pointer == Some(pointer)
            {
                diag!(self.config.diagnostics, STATE, %t, %pointer, "first pointer lifted; recognizing now");
                self.recognize(t, Some(pointer))?;
            }
        }

        let holding: Vec<GestureId> = self
            .registry
            .ids()
            .iter()
            .copied()
            .filter(|id| self.registry.get(*id).is_some_and(|g| g.runtime.holds(pointer)))
            .collect();
        let mut ended_on = Vec::new();
        for id in holding {
            if let Some(t) = self.end_gesture(id, pointer)? {
                ended_on.push(t);
            }
        }

        if self.ink.is_some_and(|(p, _)| p == pointer) {
            self.ink = None;
            self.effects.push(Effect::InkUp(event.clone()));
        }

        self.tracker.remove_everywhere(pointer);
        diag!(self.config.diagnostics, TRACKER, %pointer, targets = holders.len(), "pointer removed");

        for &t in holders {
            if self.tracker.has_pointers(t) {
                continue;
            }
            let state = self.targets.state_mut(t)?;
            if let Some(h) = state.recheck_timer.take() {
                self.scheduler.cancel(h);
            }
            if state.phase() == TargetPhase::Recognized {
                state.apply(t, Transition::Settle)?;
            }
        }
        for t in ended_on {
            let remaining = self.tracker.has_down_group(t);
            let running = self.registry.active_count(t) > 0;
            let state = self.targets.state_mut(t)?;
            if remaining && !running && !state.is_postponing() {
                if let Some(h) = state.recheck_timer.take() {
                    self.scheduler.cancel(h);
                }
                let h = self.scheduler.schedule_once(
                    self.now,
                    self.config.post_gesture_recheck_ms,
                    TimerToken::Recheck(t),
                );
                state.recheck_timer = Some(h);
            }
        }
        Ok(())
    }

    /// A pointer of a running gesture was lifted. Returns the gesture's target.
    fn end_gesture(&mut self, id: GestureId, lifted: PointerId) -> Result<Option<TargetId>, EngineError> {
        self.release_captures_of(id);
        let now = self.now;
        let Some(g) = self.registry.get_mut(id) else {
            return Ok(None);
        };
        let target = g.target;
        if !g.runtime.is_cancelled {
            g.notify_ended(now, lifted);
        }
        g.runtime.active_pointers.clear();
        g.runtime.ended_at = Some(now);
        diag!(self.config.diagnostics, STATE, gesture = %g.def.name, %lifted, "gesture ended");

        let state = self.targets.state_mut(target)?;
        if state.is_awaiting_completion() && state.completion_gesture == Some(id) {
            if let Some(h) = state.completion_timer.take() {
                self.scheduler.cancel(h);
            }
            state.apply(target, Transition::Complete)?;
            queue_for(&mut self.queues, target).clear();
        }
        Ok(Some(target))
    }

    /// Run the matcher for an acquiring target.
    ///
    /// `lifted` is the pointer whose removal forced recognition, if any.
    fn recognize(&mut self, target: TargetId, lifted: Option<PointerId>) -> Result<(), EngineError> {
        let state = self.targets.state_mut(target)?;
        if let Some(h) = state.recognize_timer.take() {
            self.scheduler.cancel(h);
        }
        state.apply(target, Transition::Recognize)?;
        let window = state.window();
        let window_started_at = state.window_started_at;

        let tracked = self.tracker.tracked(target);
        let req = MatchRequest {
            target,
            pointers: &tracked,
            now: self.now,
            window,
            window_started_at,
            from_removal: lifted.is_some(),
        };
        match find_match(&mut self.registry, &req) {
            MatchOutcome::Matched { gesture, pointers } => {
                self.commit(target, gesture, pointers, true, lifted)?;
            }
            MatchOutcome::Provisional {
                gesture,
                repeat_timeout_ms,
            } => {
                if let Some(g) = self.registry.get_mut(gesture) {
                    if let Some(h) = g.runtime.repeat_timer.take() {
                        self.scheduler.cancel(h);
                    }
                    g.runtime.repeat_timer = Some(self.scheduler.schedule_once(
                        self.now,
                        repeat_timeout_ms,
                        TimerToken::Repeat(gesture),
                    ));
                }
                self.targets.state_mut(target)?.pending_repeat = Some(gesture);
            }
            MatchOutcome::Failed { allow_propagation } => {
                self.targets.state_mut(target)?.allow_propagation = allow_propagation;
                self.flush(target, allow_propagation)?;
            }
        }
        Ok(())
    }

    /// Start a matched gesture and capture its live pointers.
    fn commit(
        &mut self,
        target: TargetId,
        id: GestureId,
        pointers: Vec<ActivePointer>,
        in_window: bool,
        lifted: Option<PointerId>,
    ) -> Result<(), EngineError> {
        let now = self.now;
        let Some(g) = self.registry.get_mut(id) else {
            return Ok(());
        };
        if let Some(h) = g.runtime.repeat_timer.take() {
            self.scheduler.cancel(h);
        }
        g.runtime.active_pointers = pointers;
        g.runtime.started_at = Some(now);
        g.runtime.ended_at = None;
        g.runtime.is_cancelled = false;
        let ink = g.notify_started(now);
        let completion_ms = g.def.completion_timeout_ms;
        let members: Vec<PointerId> = g.runtime.active_pointers.iter().map(|a| a.pointer).collect();

        for pointer in members {
            let live = self.tracker.is_down_on(target, pointer)
                || self.tracker.is_hovering_on(target, pointer);
            if !live || Some(pointer) == lifted || self.captures.contains_key(&pointer) {
                continue;
            }
            self.captures.insert(pointer, (target, id));
            self.effects.push(Effect::Capture { target, pointer });
        }
        if let Some(pointer) = ink {
            self.ink = Some((pointer, id));
        }

        if in_window {
            let state = self.targets.state_mut(target)?;
            if completion_ms > 0 {
                state.apply(target, Transition::AwaitCompletion)?;
                state.completion_gesture = Some(id);
                state.completion_timer = Some(self.scheduler.schedule_once(
                    now,
                    completion_ms,
                    TimerToken::Completion(target),
                ));
            } else {
                queue_for(&mut self.queues, target).clear();
            }
        }
        Ok(())
    }

    /// Replay or drop a target's postponed events after a failed match.
    fn flush(&mut self, target: TargetId, allow_propagation: bool) -> Result<(), EngineError> {
        let queue = queue_for(&mut self.queues, target);
        if !allow_propagation {
            let dropped = queue.clear();
            diag!(self.config.diagnostics, RELAY, %target, dropped, "propagation disabled; dropped postponed events");
            return Ok(());
        }
        match queue.replay(&self.targets)? {
            Replay::Redispatch(events) => {
                diag!(self.config.diagnostics, RELAY, %target, count = events.len(), "replaying postponed events");
                self.effects
                    .extend(events.into_iter().map(|(to, event)| Effect::Redispatch { to, event }));
            }
            Replay::Discarded(dropped) => {
                diag!(self.config.diagnostics, RELAY, %target, dropped, "queue holds a hover start; discarded");
            }
        }
        Ok(())
    }

    fn expire_completion(&mut self, target: TargetId) -> Result<(), EngineError> {
        let now = self.now;
        let state = self.targets.state_mut(target)?;
        let id = state.completion_gesture;
        state.apply(target, Transition::Complete)?;
        queue_for(&mut self.queues, target).clear();
        let Some(id) = id else {
            return Ok(());
        };
        if let Some(g) = self.registry.get_mut(id) {
            if g.runtime.is_active() {
                g.runtime.is_cancelled = true;
                g.notify_cancelled(now);
                g.runtime.active_pointers.clear();
                g.runtime.ended_at = Some(now);
                diag!(self.config.diagnostics, STATE, gesture = %g.def.name, "completion timed out; cancelled");
            }
        }
        self.release_captures_of(id);
        if self.ink.is_some_and(|(_, g)| g == id) {
            self.ink = None;
        }
        Ok(())
    }

    fn expire_repeat(&mut self, id: GestureId, handle: TimerHandle) -> Result<(), EngineError> {
        let Some(g) = self.registry.get_mut(id) else {
            return Ok(());
        };
        if g.runtime.repeat_timer != Some(handle) {
            return Ok(());
        }
        g.runtime.repeat_timer = None;
        if g.runtime.repeat_occurrences > 0 {
            g.runtime.is_cancelled = true;
        }
        diag!(self.config.diagnostics, MATCHER, gesture = %g.def.name, "repeat window expired");
        let Some((target, window)) = g.runtime.repeat_window.take() else {
            return Ok(());
        };
        let state = self.targets.state_mut(target)?;
        if state.window() == window && state.pending_repeat == Some(id) {
            state.pending_repeat = None;
            let allow = state.allow_propagation;
            self.flush(target, allow)?;
        }
        Ok(())
    }

    /// Re-run recognition on pointers left down after a gesture ended.
    fn recheck(&mut self, target: TargetId) -> Result<(), EngineError> {
        let Some(state) = self.targets.state(target) else {
            return Err(EngineError::UnknownTarget(target));
        };
        if state.is_postponing()
            || self.registry.active_count(target) > 0
            || !self.tracker.has_pointers(target)
        {
            return Ok(());
        }
        let tracked = self.tracker.tracked(target);
        let req = MatchRequest {
            target,
            pointers: &tracked,
            now: self.now,
            window: state.window(),
            window_started_at: state.window_started_at,
            from_removal: false,
        };
        match find_match(&mut self.registry, &req) {
            MatchOutcome::Matched { gesture, pointers } => {
                self.commit(target, gesture, pointers, false, None)?;
            }
            MatchOutcome::Provisional { gesture, .. } => {
                if let Some(g) = self.registry.get_mut(gesture) {
                    g.runtime.repeat_window = None;
                }
            }
            MatchOutcome::Failed { .. } => {}
        }
        Ok(())
    }

    fn on_enter(&mut self, event: PointerEvent) -> Result<Outcome, EngineError> {
        let target = event.target;
        let pointer = event.pointer();
        if !event.sample.buttons.is_empty() || !pointer.kind.supports_hover() {
            return Ok(Outcome::Continue);
        }
        let enabled = self
            .registry
            .on_target(target)
            .any(|g| g.is_enabled() && g.wants_hover());
        if !enabled || self.tracker.is_down_anywhere(pointer) {
            return Ok(Outcome::Continue);
        }
        if self.hover.hovered_by_other(target, pointer) {
            diag!(self.config.diagnostics, HOVER, %pointer, %target, "target already hovered");
            return Ok(Outcome::Continue);
        }
        match self.hover.phase(pointer) {
            HoverPhase::Confirmed => return Ok(Outcome::Continue),
            HoverPhase::Arming => {
                if let Some(h) = self.hover.cancel(pointer).timer {
                    self.scheduler.cancel(h);
                }
            }
            HoverPhase::Idle => {}
        }

        let timeout = hover_timeout_for(&self.config, &self.settings, target);
        if timeout == 0 {
            let sample = self.hover.confirm_now(target, event.sample);
            diag!(self.config.diagnostics, HOVER, %pointer, %target, "hover confirmed immediately");
            self.on_contact_start(PointerEvent::new(EventKind::HoverStart, target, sample))?;
        } else {
            let h = self
                .scheduler
                .schedule_once(self.now, timeout, TimerToken::HoverSettle(pointer));
            self.hover.arm(target, event.sample, h);
            diag!(self.config.diagnostics, HOVER, %pointer, %target, timeout, "hover arming");
        }
        Ok(Outcome::Continue)
    }

    fn on_leave(&mut self, event: PointerEvent) -> Result<Outcome, EngineError> {
        let pointer = event.pointer();
        if !event.sample.buttons.is_empty() || self.hover.target_of(pointer) != Some(event.target) {
            return Ok(Outcome::Continue);
        }
        let cancel = self.hover.cancel(pointer);
        if let Some(h) = cancel.timer {
            self.scheduler.cancel(h);
        }
        if cancel.confirmed_on.is_some() {
            self.on_terminal(event)?;
        }
        diag!(self.config.diagnostics, HOVER, %pointer, "hover left");
        Ok(Outcome::Continue)
    }

    fn release_captures_of(&mut self, id: GestureId) {
        let held: Vec<(PointerId, TargetId)> = self
            .captures
            .iter()
            .filter(|(_, (_, g))| *g == id)
            .map(|(p, (t, _))| (*p, *t))
            .collect();
        for (pointer, target) in held {
            self.captures.remove(&pointer);
            self.effects.push(Effect::ReleaseCapture { target, pointer });
        }
    }
}

impl<L: SettingsLookup> Coordinator<VirtualScheduler, L> {
    /// Fire every timer due at or before `now`, in deadline order.
    ///
    /// Returns the number of timers fired.
    pub fn advance_to(&mut self, now: u64) -> Result<usize, EngineError> {
        let mut fired = 0;
        while let Some(due) = self.scheduler.pop_due(now) {
            self.fire_timer(due.handle, due.token, due.deadline)?;
            fired += 1;
        }
        self.now = self.now.max(now);
        Ok(fired)
    }
}

fn queue_for(queues: &mut BTreeMap<TargetId, PostponedQueue>, target: TargetId) -> &mut PostponedQueue {
    queues
        .entry(target)
        .or_insert_with(|| PostponedQueue::new(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HoverOverrides;
    use crate::event::PointerSample;
    use crate::gesture::{GestureBehavior, GestureContext};
    use crate::types::PointerButtons;
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use core::cell::RefCell;
    use kurbo::Point;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Started(String, Vec<Point>),
        Ended(String, PointerId),
        Cancelled(String),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct Recorder(Log);

    impl GestureBehavior for Recorder {
        fn started(&mut self, cx: &mut GestureContext<'_>) {
            let at = cx.pointers().iter().map(|p| p.position).collect();
            self.0.borrow_mut().push(Call::Started(cx.name().to_string(), at));
        }

        fn ended(&mut self, cx: &mut GestureContext<'_>, lifted: PointerId) {
            self.0
                .borrow_mut()
                .push(Call::Ended(cx.name().to_string(), lifted));
        }

        fn cancelled(&mut self, cx: &mut GestureContext<'_>) {
            self.0
                .borrow_mut()
                .push(Call::Cancelled(cx.name().to_string()));
        }
    }

    struct Inker;

    impl GestureBehavior for Inker {
        fn started(&mut self, cx: &mut GestureContext<'_>) {
            if let Some(p) = cx.pointers().first().map(|p| p.pointer) {
                cx.drive_ink(p);
            }
        }
    }

    struct Never;

    impl GestureBehavior for Never {
        fn conditional(&self, _cx: &GestureContext<'_>) -> bool {
            false
        }
    }

    fn fixture() -> (Coordinator<VirtualScheduler>, TargetId, Log) {
        let mut c = Coordinator::new(VirtualScheduler::new());
        let surface = c.add_surface();
        (c, surface, Log::default())
    }

    fn touch(raw: u64, x: f64, t: u64) -> PointerSample {
        PointerSample::new(PointerId::touch(raw), Point::new(x, x), t)
    }

    fn started(log: &Log) -> Vec<String> {
        log.borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Started(n, _) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    fn redispatched(effects: &[Effect]) -> Vec<&PointerEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Redispatch { event, .. } => Some(event),
                _ => None,
            })
            .collect()
    }

    fn tap(c: &mut Coordinator<VirtualScheduler>, t: TargetId, raw: u64, at: u64) {
        c.handle(PointerEvent::down(t, touch(raw, 0.0, at))).unwrap();
        c.advance_to(at).unwrap();
        c.handle(PointerEvent::up(t, touch(raw, 0.0, at + 20)))
            .unwrap();
    }

    #[test]
    fn tap_starts_captures_and_ends() {
        let (mut c, s, log) = fixture();
        c.register(GestureDefinition::new("tap", s, &["touch"]).behavior(Recorder(log.clone())))
            .unwrap();
        assert_eq!(c.drain_effects(), [Effect::AttachListeners(s)]);

        let out = c.handle(PointerEvent::down(s, touch(1, 3.0, 0))).unwrap();
        assert_eq!(out, Outcome::StopAndConsume);
        assert!(c.target_state(s).unwrap().is_acquiring());
        c.advance_to(0).unwrap();
        assert_eq!(
            log.borrow()[0],
            Call::Started("tap".into(), [Point::new(3.0, 3.0)].into())
        );
        assert_eq!(c.capture_owner(PointerId::touch(1)), c.registry().id_of("tap"));

        let out = c.handle(PointerEvent::up(s, touch(1, 3.0, 40))).unwrap();
        assert_eq!(out, Outcome::StopAndConsume);
        assert_eq!(log.borrow()[1], Call::Ended("tap".into(), PointerId::touch(1)));
        assert_eq!(
            c.drain_effects(),
            [
                Effect::Capture {
                    target: s,
                    pointer: PointerId::touch(1)
                },
                Effect::ReleaseCapture {
                    target: s,
                    pointer: PointerId::touch(1)
                },
            ]
        );
        assert_eq!(c.active_gesture_count(s), 0);
        assert_eq!(c.target_state(s).unwrap().phase(), TargetPhase::Idle);
        assert!(!c.tracker().has_down_group(s));
    }

    #[test]
    fn double_tap_within_repeat_timeout() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("double", s, &["touch"])
                .repeat(2, 300)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.register(GestureDefinition::new("single", s, &["touch"]).behavior(Recorder(log.clone())))
            .unwrap();

        tap(&mut c, s, 1, 0);
        assert!(started(&log).is_empty());
        assert!(c.target_state(s).unwrap().pending_repeat().is_some());
        tap(&mut c, s, 1, 100);
        assert_eq!(started(&log), ["double"]);
        c.advance_to(1000).unwrap();
        assert_eq!(started(&log), ["double"]);
    }

    #[test]
    fn slow_double_tap_falls_through_to_single() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("double", s, &["touch"])
                .repeat(2, 300)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.register(GestureDefinition::new("single", s, &["touch"]).behavior(Recorder(log.clone())))
            .unwrap();
        c.drain_effects();

        tap(&mut c, s, 1, 0);
        c.advance_to(300).unwrap();
        // The first tap's window is replayed back to the surface.
        let effects = c.drain_effects();
        let replayed = redispatched(&effects);
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].kind, EventKind::Down);
        assert_eq!(replayed[1].kind, EventKind::Up);
        assert!(replayed.iter().all(|e| e.terminal_replay));

        tap(&mut c, s, 1, 400);
        assert_eq!(started(&log), ["single"]);
    }

    #[test]
    fn hover_confirms_with_latest_position() {
        let (mut c, s, log) = fixture();
        c.register(GestureDefinition::new("hint", s, &["hover"]).behavior(Recorder(log.clone())))
            .unwrap();
        let pen = PointerId::pen(1);
        c.handle(PointerEvent::enter(s, PointerSample::new(pen, Point::ZERO, 0)))
            .unwrap();
        assert_eq!(c.hover().phase(pen), HoverPhase::Arming);
        c.handle(PointerEvent::moved(s, PointerSample::new(pen, Point::new(40.0, 40.0), 100)))
            .unwrap();
        c.advance_to(149).unwrap();
        assert_eq!(c.hover().phase(pen), HoverPhase::Arming);
        assert!(started(&log).is_empty());

        c.advance_to(150).unwrap();
        assert!(c.tracker().is_hovering_on(s, pen));
        assert_eq!(
            log.borrow()[0],
            Call::Started("hint".into(), [Point::new(40.0, 40.0)].into())
        );

        c.handle(PointerEvent::leave(s, PointerSample::new(pen, Point::new(90.0, 0.0), 300)))
            .unwrap();
        assert_eq!(c.hover().phase(pen), HoverPhase::Idle);
        assert!(!c.tracker().has_hover_group(s));
        assert_eq!(log.borrow()[1], Call::Ended("hint".into(), pen));
    }

    #[test]
    fn zero_hover_timeout_confirms_with_enter_position() {
        let mut c = Coordinator::with_settings(
            VirtualScheduler::new(),
            HoverOverrides::new(),
            EngineConfig::default(),
        );
        let s = c.add_surface();
        c.settings_mut().set(s, Some(0));
        c.register(GestureDefinition::new("hint", s, &["hover"]))
            .unwrap();
        let mouse = PointerId::mouse(0);
        c.handle(PointerEvent::enter(s, PointerSample::new(mouse, Point::new(5.0, 5.0), 10)))
            .unwrap();
        assert_eq!(c.hover().phase(mouse), HoverPhase::Confirmed);
        assert_eq!(
            c.tracker().latest(s, mouse).map(|s| s.position),
            Some(Point::new(5.0, 5.0))
        );
    }

    #[test]
    fn contact_cancels_arming_hover() {
        let (mut c, s, log) = fixture();
        c.register(GestureDefinition::new("hint", s, &["hover"]).behavior(Recorder(log.clone())))
            .unwrap();
        let pen = PointerId::pen(1);
        c.handle(PointerEvent::enter(s, PointerSample::new(pen, Point::ZERO, 0)))
            .unwrap();
        c.handle(PointerEvent::down(s, PointerSample::new(pen, Point::ZERO, 50)))
            .unwrap();
        assert_eq!(c.hover().phase(pen), HoverPhase::Idle);
        c.advance_to(500).unwrap();
        assert!(!c.tracker().is_hovering_on(s, pen));
        assert!(started(&log).is_empty());
    }

    #[test]
    fn failed_window_replays_clones_to_parent() {
        let (mut c, root, _log) = fixture();
        let child = c.add_target(root).unwrap();
        c.register(GestureDefinition::new("pinch", child, &["touch:2"]).recognition_timeout(100))
            .unwrap();
        c.drain_effects();

        assert_eq!(
            c.handle(PointerEvent::down(child, touch(1, 0.0, 0))).unwrap(),
            Outcome::StopAndConsume
        );
        c.handle(PointerEvent::moved(child, touch(1, 1.0, 10)))
            .unwrap();
        c.handle(PointerEvent::moved(child, touch(1, 2.0, 20)))
            .unwrap();
        assert_eq!(c.postponed(child).len(), 3);
        c.advance_to(100).unwrap();

        let effects = c.drain_effects();
        let replayed = redispatched(&effects);
        assert_eq!(
            replayed.iter().map(|e| e.kind).collect::<Vec<_>>(),
            [EventKind::Down, EventKind::Move, EventKind::Move]
        );
        assert!(replayed.iter().all(|e| e.target == root && !e.terminal_replay));
        assert_eq!(replayed[2].sample.position, Point::new(2.0, 2.0));
        assert!(effects.iter().all(|e| match e {
            Effect::Redispatch { to, .. } => *to == root,
            _ => true,
        }));
        assert!(c.postponed(child).is_empty());

        // The root has no gestures, so replayed input passes through.
        for e in replayed {
            assert_eq!(c.handle(e.clone()).unwrap(), Outcome::Continue);
        }
    }

    fn mouse(t: u64) -> PointerSample {
        PointerSample::new(PointerId::mouse(0), Point::ZERO, t).with_buttons(PointerButtons::PRIMARY)
    }

    #[test]
    fn touch_and_mouse_do_not_make_two_touches() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("two", s, &["touch:2"])
                .recognition_timeout(50)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.handle(PointerEvent::down(s, mouse(10))).unwrap();
        assert!(c.tracker().is_down_on(s, PointerId::mouse(0)));
        c.advance_to(50).unwrap();
        assert!(started(&log).is_empty());
        assert_eq!(c.active_gesture_count(s), 0);
    }

    #[test]
    fn stray_mouse_blocks_single_touch_gesture() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("tap", s, &["touch"])
                .recognition_timeout(50)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.drain_effects();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        // No gesture here takes a mouse, but the window is open.
        let out = c.handle(PointerEvent::down(s, mouse(10))).unwrap();
        assert_eq!(out, Outcome::StopAndConsume);
        assert_eq!(c.postponed(s).len(), 2);

        c.advance_to(50).unwrap();
        assert!(started(&log).is_empty());
        assert_eq!(c.active_gesture_count(s), 0);
        let effects = c.drain_effects();
        let replayed = redispatched(&effects);
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].pointer(), PointerId::touch(1));
        assert_eq!(replayed[1].pointer(), PointerId::mouse(0));
        assert!(replayed.iter().all(|e| e.terminal_replay));

        c.handle(PointerEvent::up(s, mouse(60))).unwrap();
        c.handle(PointerEvent::up(s, touch(1, 0.0, 70))).unwrap();
        assert!(!c.tracker().has_pointers(s));
    }

    #[test]
    fn stray_mouse_outside_a_window_bubbles() {
        let (mut c, s, _log) = fixture();
        c.register(GestureDefinition::new("tap", s, &["touch"]))
            .unwrap();
        let out = c.handle(PointerEvent::down(s, mouse(0))).unwrap();
        assert_eq!(out, Outcome::Continue);
        assert_eq!(c.target_state(s).unwrap().phase(), TargetPhase::Idle);
        assert!(c.postponed(s).is_empty());
        assert_eq!(c.handle(PointerEvent::up(s, mouse(10))).unwrap(), Outcome::Continue);
        assert!(!c.tracker().has_pointers(s));
    }

    #[test]
    fn only_gesture_pointers_bubble_while_awaiting_completion() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("press", s, &["touch"])
                .completion_timeout(500)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.advance_to(0).unwrap();
        assert!(c.target_state(s).unwrap().is_awaiting_completion());

        let out = c.handle(PointerEvent::down(s, touch(2, 0.0, 10))).unwrap();
        assert_eq!(out, Outcome::StopAndConsume);
        let out = c.handle(PointerEvent::moved(s, touch(2, 4.0, 20))).unwrap();
        assert_eq!(out, Outcome::StopAndConsume);
        let out = c.handle(PointerEvent::moved(s, touch(1, 4.0, 30))).unwrap();
        assert_eq!(out, Outcome::Stop);

        c.handle(PointerEvent::up(s, touch(2, 4.0, 40))).unwrap();
        c.handle(PointerEvent::up(s, touch(1, 4.0, 50))).unwrap();
        assert_eq!(started(&log), ["press"]);
        assert_eq!(log.borrow()[1], Call::Ended("press".into(), PointerId::touch(1)));
        assert_eq!(c.active_gesture_count(s), 0);
    }

    #[test]
    fn quick_lift_recognizes_slow_lift_fails() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("tap", s, &["touch"])
                .recognition_timeout(500)
                .completion_timeout(200)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.drain_effects();

        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.handle(PointerEvent::up(s, touch(1, 0.0, 100))).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                Call::Started("tap".into(), [Point::ZERO].into()),
                Call::Ended("tap".into(), PointerId::touch(1)),
            ]
        );
        // The lifted pointer is never captured.
        assert!(c.drain_effects().is_empty());
        assert_eq!(c.target_state(s).unwrap().phase(), TargetPhase::Idle);

        c.handle(PointerEvent::down(s, touch(1, 0.0, 1000))).unwrap();
        c.handle(PointerEvent::up(s, touch(1, 0.0, 1300))).unwrap();
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(redispatched(&c.drain_effects()).len(), 2);
        assert_eq!(c.scheduler().pending_len(), 0);
    }

    #[test]
    fn completion_timeout_cancels_gesture() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("press", s, &["touch"])
                .completion_timeout(200)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.drain_effects();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.advance_to(0).unwrap();
        assert!(c.target_state(s).unwrap().is_awaiting_completion());
        assert_eq!(
            c.handle(PointerEvent::moved(s, touch(1, 5.0, 50))).unwrap(),
            Outcome::Stop
        );

        c.advance_to(200).unwrap();
        assert_eq!(log.borrow()[1], Call::Cancelled("press".into()));
        assert_eq!(c.capture_owner(PointerId::touch(1)), None);
        assert!(c.postponed(s).is_empty());
        assert_eq!(
            c.drain_effects(),
            [
                Effect::Capture {
                    target: s,
                    pointer: PointerId::touch(1)
                },
                Effect::ReleaseCapture {
                    target: s,
                    pointer: PointerId::touch(1)
                },
            ]
        );

        c.handle(PointerEvent::up(s, touch(1, 0.0, 300))).unwrap();
        assert_eq!(log.borrow().len(), 2);
        assert!(c.drain_effects().is_empty());
    }

    #[test]
    fn remaining_pointer_is_rechecked_after_gesture_ends() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("pinch", s, &["touch:2"])
                .recognition_timeout(50)
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        c.register(GestureDefinition::new("pan", s, &["touch"]).behavior(Recorder(log.clone())))
            .unwrap();

        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.handle(PointerEvent::down(s, touch(2, 9.0, 10))).unwrap();
        c.advance_to(50).unwrap();
        assert_eq!(started(&log), ["pinch"]);

        c.handle(PointerEvent::up(s, touch(2, 9.0, 100))).unwrap();
        assert_eq!(log.borrow()[1], Call::Ended("pinch".into(), PointerId::touch(2)));
        c.advance_to(129).unwrap();
        assert_eq!(started(&log), ["pinch"]);
        c.advance_to(130).unwrap();
        assert_eq!(started(&log), ["pinch", "pan"]);
        assert_eq!(c.capture_owner(PointerId::touch(1)), c.registry().id_of("pan"));
    }

    #[test]
    fn duplicate_down_synthesizes_up() {
        let (mut c, s, log) = fixture();
        c.register(GestureDefinition::new("tap", s, &["touch"]).behavior(Recorder(log.clone())))
            .unwrap();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.advance_to(0).unwrap();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 10))).unwrap();
        assert_eq!(log.borrow()[1], Call::Ended("tap".into(), PointerId::touch(1)));
        assert!(c.target_state(s).unwrap().is_acquiring());
        c.advance_to(10).unwrap();
        assert_eq!(started(&log), ["tap", "tap"]);
    }

    #[test]
    fn released_mouse_move_synthesizes_up() {
        let (mut c, s, log) = fixture();
        c.register(GestureDefinition::new("drag", s, &["mouse"]).behavior(Recorder(log.clone())))
            .unwrap();
        let mouse = PointerId::mouse(0);
        c.handle(PointerEvent::down(s, PointerSample::new(mouse, Point::ZERO, 0)))
            .unwrap();
        c.advance_to(0).unwrap();
        let held = PointerSample::new(mouse, Point::new(3.0, 0.0), 5).with_buttons(PointerButtons::PRIMARY);
        c.handle(PointerEvent::moved(s, held)).unwrap();
        assert_eq!(c.active_gesture_count(s), 1);
        c.handle(PointerEvent::moved(s, PointerSample::new(mouse, Point::new(4.0, 0.0), 9)))
            .unwrap();
        assert_eq!(c.active_gesture_count(s), 0);
        assert_eq!(log.borrow()[1], Call::Ended("drag".into(), mouse));
    }

    #[test]
    fn ink_follows_requested_pointer() {
        let (mut c, s, _log) = fixture();
        c.register(GestureDefinition::new("ink", s, &["pen"]).behavior(Inker))
            .unwrap();
        c.drain_effects();
        let pen = PointerId::pen(1);
        let pressed = |x: f64, t: u64| {
            PointerSample::new(pen, Point::new(x, 0.0), t).with_buttons(PointerButtons::PRIMARY)
        };
        c.handle(PointerEvent::down(s, pressed(0.0, 0))).unwrap();
        c.advance_to(0).unwrap();
        c.handle(PointerEvent::moved(s, pressed(1.0, 5))).unwrap();
        c.handle(PointerEvent::up(s, pressed(2.0, 9))).unwrap();
        let effects = c.drain_effects();
        assert!(matches!(effects[1], Effect::InkMove(ref e) if e.sample.position.x == 1.0));
        assert!(matches!(effects[2], Effect::ReleaseCapture { .. }));
        assert!(matches!(effects.last(), Some(Effect::InkUp(_))));
    }

    #[test]
    fn hover_only_queue_is_not_replayed() {
        let (mut c, s, _log) = fixture();
        c.register(GestureDefinition::new("hint", s, &["hover"]).behavior(Never))
            .unwrap();
        c.drain_effects();
        c.handle(PointerEvent::enter(s, PointerSample::new(PointerId::pen(1), Point::ZERO, 0)))
            .unwrap();
        c.advance_to(150).unwrap();
        assert!(c.target_state(s).unwrap().has_recognition_run());
        assert!(c.drain_effects().is_empty());
        assert!(c.postponed(s).is_empty());
    }

    #[test]
    fn listeners_attach_and_detach_with_gestures() {
        let (mut c, s, _log) = fixture();
        c.register(GestureDefinition::new("a", s, &["touch"])).unwrap();
        c.register(GestureDefinition::new("b", s, &["pen"])).unwrap();
        assert_eq!(c.drain_effects(), [Effect::AttachListeners(s)]);
        c.remove("a").unwrap();
        assert!(c.drain_effects().is_empty());
        c.remove("b").unwrap();
        assert_eq!(c.drain_effects(), [Effect::DetachListeners(s)]);
        assert_eq!(
            c.remove("b"),
            Err(RegistrationError::UnknownGesture("b".into()))
        );
    }

    #[test]
    fn removing_a_running_gesture_releases_its_capture() {
        let (mut c, s, _log) = fixture();
        c.register(GestureDefinition::new("press", s, &["touch"]).completion_timeout(200))
            .unwrap();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.advance_to(0).unwrap();
        c.drain_effects();
        c.remove("press").unwrap();
        assert_eq!(
            c.drain_effects(),
            [
                Effect::ReleaseCapture {
                    target: s,
                    pointer: PointerId::touch(1)
                },
                Effect::DetachListeners(s),
            ]
        );
        assert!(!c.target_state(s).unwrap().is_awaiting_completion());
        assert_eq!(c.scheduler().pending_len(), 0);
    }

    #[test]
    fn unknown_targets_are_rejected() {
        let (mut c, _s, _log) = fixture();
        let bogus = TargetId(42);
        assert_eq!(
            c.handle(PointerEvent::down(bogus, touch(1, 0.0, 0))),
            Err(EngineError::UnknownTarget(bogus))
        );
        assert_eq!(c.add_target(bogus), Err(EngineError::UnknownTarget(bogus)));
    }

    #[test]
    fn disabled_group_does_not_match() {
        let (mut c, s, log) = fixture();
        c.register(
            GestureDefinition::new("tool*", s, &["touch"])
                .behavior(Recorder(log.clone())),
        )
        .unwrap();
        assert_eq!(c.set_group_enabled("tool", false), 1);
        c.handle(PointerEvent::down(s, touch(1, 0.0, 0))).unwrap();
        c.advance_to(0).unwrap();
        assert!(started(&log).is_empty());
        assert!(c.postponed(s).is_empty());
    }

    #[test]
    fn timestamps_are_monotonic() {
        let (mut c, s, _log) = fixture();
        c.register(GestureDefinition::new("pinch", s, &["touch:2"]).recognition_timeout(50))
            .unwrap();
        c.handle(PointerEvent::down(s, touch(1, 0.0, 100))).unwrap();
        c.handle(PointerEvent::moved(s, touch(1, 0.0, 90))).unwrap();
        assert_eq!(c.postponed(s)[1].sample.timestamp, 100);
        assert_eq!(c.postponed(s)[1].redispatch_age, Some(100));
    }
}
