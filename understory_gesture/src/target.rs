// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target arena and the per-target recognition state machine.
//!
//! ## Overview
//!
//! Every interactive element is represented by a [`TargetId`] issued from a
//! [`TargetArena`]. Handles are monotonic and never recycled. The arena also
//! records the parent of each target, which is where unmatched input is
//! replayed.
//!
//! Each target owns one [`TargetState`], created with the target and never
//! deleted. Its lifecycle is:
//!
//! ```text
//! Idle --OpenWindow--> Acquiring --Recognize--> Recognized --Settle--> Idle
//!                                                   |   ^
//!                                     AwaitCompletion   Complete
//!                                                   v   |
//!                                           AwaitingCompletion
//! ```
//!
//! `Recognized` means recognition ran for the current window. A new window may
//! open from `Idle` or `Recognized`; only opening a window resets
//! [`TargetState::has_recognition_run`].

use alloc::vec::Vec;

use crate::error::EngineError;
use crate::scheduler::TimerHandle;
use crate::types::{GestureId, ParentLookup, PointerId, TargetId};

/// Phase of a target's acquisition/recognition lifecycle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TargetPhase {
    /// No window is open.
    #[default]
    Idle,
    /// Collecting pointers; events are postponed.
    Acquiring,
    /// Recognition ran for the current window.
    Recognized,
    /// A recognized gesture is inside its completion grace period.
    AwaitingCompletion,
}

/// Guarded transitions of [`TargetPhase`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// First pointer of a new window arrived.
    OpenWindow,
    /// The matcher ran.
    Recognize,
    /// A gesture with a completion timeout was recognized.
    AwaitCompletion,
    /// The completion period ended (lift or timer).
    Complete,
    /// All pointers are gone.
    Settle,
}

impl TargetPhase {
    /// Next phase for `transition`, or `None` if it is not allowed from here.
    pub const fn next(self, transition: Transition) -> Option<Self> {
        use TargetPhase::*;
        use Transition::*;
        match (self, transition) {
            (Idle | Recognized, OpenWindow) => Some(Acquiring),
            (Acquiring, Recognize) => Some(Recognized),
            (Recognized, AwaitCompletion) => Some(AwaitingCompletion),
            (AwaitingCompletion, Complete) => Some(Recognized),
            (Idle | Recognized, Settle) => Some(Idle),
            _ => None,
        }
    }
}

/// Recognition state of one target.
#[derive(Clone, Debug, Default)]
pub struct TargetState {
    phase: TargetPhase,
    has_recognition_run: bool,
    pub(crate) recognize_timer: Option<TimerHandle>,
    pub(crate) completion_timer: Option<TimerHandle>,
    pub(crate) recheck_timer: Option<TimerHandle>,
    pub(crate) completion_gesture: Option<GestureId>,
    pub(crate) pending_repeat: Option<GestureId>,
    pub(crate) window_seq: u64,
    pub(crate) window_started_at: u64,
    pub(crate) window_pointer: Option<PointerId>,
    pub(crate) allow_propagation: bool,
}

impl TargetState {
    /// Current phase.
    pub fn phase(&self) -> TargetPhase {
        self.phase
    }

    /// Whether pointers are being collected.
    pub fn is_acquiring(&self) -> bool {
        self.phase == TargetPhase::Acquiring
    }

    /// Whether a recognized gesture is inside its completion period.
    pub fn is_awaiting_completion(&self) -> bool {
        self.phase == TargetPhase::AwaitingCompletion
    }

    /// Whether recognition already ran for the current window.
    pub fn has_recognition_run(&self) -> bool {
        self.has_recognition_run
    }

    /// Whether events for this target are currently postponed.
    ///
    /// This is the case while acquiring, while awaiting completion, and while
    /// a provisional repeat match keeps the window's events for a later replay.
    pub fn is_postponing(&self) -> bool {
        self.pending_repeat.is_some()
            || matches!(
                self.phase,
                TargetPhase::Acquiring | TargetPhase::AwaitingCompletion
            )
    }

    /// Repeat gesture waiting for its next occurrence in this window.
    pub fn pending_repeat(&self) -> Option<GestureId> {
        self.pending_repeat
    }

    /// Identifier of the current acquisition window.
    pub fn window(&self) -> u64 {
        self.window_seq
    }

    /// Apply a transition.
    pub fn apply(
        &mut self,
        target: TargetId,
        transition: Transition,
    ) -> Result<TargetPhase, EngineError> {
        let next = self
            .phase
            .next(transition)
            .ok_or(EngineError::InvalidTransition {
                target,
                from: self.phase,
                transition,
            })?;
        match transition {
            Transition::OpenWindow => {
                self.has_recognition_run = false;
                self.pending_repeat = None;
                self.window_seq += 1;
                self.allow_propagation = true;
            }
            Transition::Recognize => self.has_recognition_run = true,
            Transition::Complete | Transition::Settle => self.completion_gesture = None,
            Transition::AwaitCompletion => {}
        }
        self.phase = next;
        Ok(next)
    }
}

#[derive(Clone, Debug)]
struct Node {
    parent: Option<TargetId>,
    state: TargetState,
}

/// Issues target handles and stores per-target state.
#[derive(Clone, Debug, Default)]
pub struct TargetArena {
    nodes: Vec<Node>,
}

impl TargetArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new handle below `parent` (or a root surface for `None`).
    pub fn insert(&mut self, parent: Option<TargetId>) -> TargetId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "TargetId uses 32-bit indices by design."
        )]
        let id = TargetId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent,
            state: TargetState::default(),
        });
        id
    }

    /// Whether `target` was issued by this arena.
    pub fn contains(&self, target: TargetId) -> bool {
        (target.0 as usize) < self.nodes.len()
    }

    /// Number of issued handles.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no handle was issued.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// State of `target`.
    pub fn state(&self, target: TargetId) -> Option<&TargetState> {
        self.nodes.get(target.0 as usize).map(|n| &n.state)
    }

    pub(crate) fn state_mut(&mut self, target: TargetId) -> Result<&mut TargetState, EngineError> {
        self.nodes
            .get_mut(target.0 as usize)
            .map(|n| &mut n.state)
            .ok_or(EngineError::UnknownTarget(target))
    }
}

impl ParentLookup<TargetId> for TargetArena {
    fn parent_of(&self, node: &TargetId) -> Option<TargetId> {
        self.nodes.get(node.0 as usize)?.parent
    }
}
