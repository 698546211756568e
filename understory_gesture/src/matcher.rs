// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture matcher.
//!
//! ## Overview
//!
//! Given the pointers active on a target, [`find_match`] walks the target's
//! gestures in registration order and returns the first full match:
//!
//! 1. Disabled and already-running gestures are skipped. A gesture whose
//!    repeat sequence timed out with occurrences pending is skipped once and
//!    its counter reset.
//! 2. Any examined gesture that forbids propagation disables it for the window.
//! 3. Some permutation must match the pointer counts exactly.
//! 4. When recognition was forced by a lift, the window must be younger than
//!    the gesture's completion timeout.
//! 5. The conditional predicate must accept, and an exclusive gesture needs
//!    the target to have no running gesture.
//! 6. A repeat-count gesture counts an occurrence. Until the count is reached
//!    the result is [`MatchOutcome::Provisional`] and the search stops.
//!
//! The matcher only updates repeat counters. Committing a match (callbacks,
//! capture, timers) is the coordinator's job.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::diag::diag;
use crate::gesture::ActivePointer;
use crate::permutation::{Permutation, PointerClass, PointerCounts};
use crate::registry::GestureRegistry;
use crate::tracker::TrackedPointer;
use crate::types::{GestureId, TargetId};

/// Inputs for one recognition attempt.
#[derive(Copy, Clone, Debug)]
pub struct MatchRequest<'a> {
    /// Target being recognized.
    pub target: TargetId,
    /// Active pointers on the target, in arrival order.
    pub pointers: &'a [TrackedPointer],
    /// Engine time.
    pub now: u64,
    /// Acquisition window identifier.
    pub window: u64,
    /// Time the first pointer of the window went down.
    pub window_started_at: u64,
    /// Recognition was forced by a pointer lift.
    pub from_removal: bool,
}

/// Result of a recognition attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    /// A gesture matched fully.
    Matched {
        /// The winner.
        gesture: GestureId,
        /// Its pointers with ordinals relative to the matched permutation.
        pointers: Vec<ActivePointer>,
    },
    /// A repeat-count gesture counted an occurrence but needs more.
    Provisional {
        /// The repeat gesture.
        gesture: GestureId,
        /// How long to wait for the next occurrence.
        repeat_timeout_ms: u64,
    },
    /// Nothing matched.
    Failed {
        /// Whether the postponed events may be replayed to the parent.
        allow_propagation: bool,
    },
}

/// Run the matcher for one target.
pub fn find_match(registry: &mut GestureRegistry, req: &MatchRequest<'_>) -> MatchOutcome {
    let diagnostics = registry.diagnostics;
    let mut counts = PointerCounts::default();
    for p in req.pointers {
        counts.add(p.class());
    }
    let running = registry.active_count(req.target);
    let mut allow_propagation = true;

    for id in registry.ids_on(req.target) {
        let Some(g) = registry.get_mut(id) else {
            continue;
        };
        // A gesture has a single instance; a running one never matches again.
        if !g.def.is_enabled || g.runtime.is_active() {
            continue;
        }
        if g.runtime.is_cancelled_with_pending() {
            g.runtime.repeat_occurrences = 0;
            g.runtime.last_repeat_at = None;
            g.runtime.is_cancelled = false;
            diag!(diagnostics, MATCHER, gesture = %g.def.name, "skipped timed-out repeat sequence");
            continue;
        }
        if !g.def.allows_event_propagation {
            allow_propagation = false;
        }

        let Some(perm) = g
            .permutations
            .iter()
            .find(|p| p.is_satisfied_by(&counts))
            .copied()
        else {
            continue;
        };

        if req.from_removal && g.def.completion_timeout_ms > 0 {
            let elapsed = req.now.saturating_sub(req.window_started_at);
            if elapsed >= g.def.completion_timeout_ms {
                diag!(diagnostics, MATCHER, gesture = %g.def.name, elapsed, "lifted too slowly");
                continue;
            }
        }

        let pointers = assign_ordinals(&perm, req.pointers);
        if !g.check_conditional(&pointers, req.now) {
            diag!(diagnostics, MATCHER, gesture = %g.def.name, "conditional rejected");
            continue;
        }
        if g.def.is_exclusive && running > 0 {
            diag!(diagnostics, MATCHER, gesture = %g.def.name, running, "exclusive gesture blocked");
            continue;
        }

        if g.def.repeat_count > 1 {
            let rt = &mut g.runtime;
            if rt
                .last_repeat_at
                .is_some_and(|last| req.now.saturating_sub(last) > g.def.repeat_timeout_ms)
            {
                rt.repeat_occurrences = 0;
            }
            rt.repeat_occurrences += 1;
            rt.last_repeat_at = Some(req.now);
            if rt.repeat_occurrences < g.def.repeat_count {
                rt.repeat_window = Some((req.target, req.window));
                diag!(
                    diagnostics,
                    MATCHER,
                    gesture = %g.def.name,
                    occurrences = rt.repeat_occurrences,
                    "provisional repeat match"
                );
                return MatchOutcome::Provisional {
                    gesture: id,
                    repeat_timeout_ms: g.def.repeat_timeout_ms,
                };
            }
            rt.repeat_occurrences = 0;
            rt.repeat_window = None;
        }

        diag!(diagnostics, MATCHER, gesture = %g.def.name, target = %req.target, "matched");
        return MatchOutcome::Matched {
            gesture: id,
            pointers,
        };
    }

    diag!(diagnostics, MATCHER, target = %req.target, allow_propagation, "no gesture matched");
    MatchOutcome::Failed { allow_propagation }
}

/// Number the pointers per claimed class, in arrival order.
fn assign_ordinals(perm: &Permutation, tracked: &[TrackedPointer]) -> Vec<ActivePointer> {
    let mut next: BTreeMap<PointerClass, u16> = BTreeMap::new();
    tracked
        .iter()
        .map(|p| {
            let class = perm.claim(p.class());
            let slot = next.entry(class).or_insert(0);
            let ordinal = *slot;
            *slot += 1;
            ActivePointer {
                pointer: p.start.pointer,
                class,
                ordinal,
                position: p.latest.position,
                since: p.start.timestamp,
                hovering: p.hovering,
            }
        })
        .collect()
}
