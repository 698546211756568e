// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Configuration errors are reported at registration time. Engine errors
//! signal internal-consistency defects. A gesture that simply fails to match
//! is not an error.

use alloc::string::String;

use thiserror::Error;

use crate::event::EventKind;
use crate::target::{TargetPhase, Transition};
use crate::types::TargetId;

/// Errors in a pointer-type permutation string such as `touch:2+pen`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PermutationError {
    /// The string (or one of its `+` parts) was empty.
    #[error("empty permutation term")]
    Empty,
    /// Unknown pointer class.
    #[error("unknown pointer class `{0}`")]
    UnknownClass(String),
    /// The count after `:` was not a positive integer.
    #[error("invalid pointer count `{0}`")]
    InvalidCount(String),
}

/// Invalid gesture registration or registry operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// A gesture with this explicit name already exists.
    #[error("a gesture named `{0}` is already registered")]
    DuplicateName(String),
    /// The definition names no target.
    #[error("gesture `{0}` has no target")]
    MissingTarget(String),
    /// The definition names a target the coordinator never issued.
    #[error("gesture `{name}` names unknown {target}")]
    UnknownTarget {
        /// Gesture name.
        name: String,
        /// Offending target.
        target: TargetId,
    },
    /// The definition declares no pointer-type permutations.
    #[error("gesture `{0}` declares no pointer requirement")]
    MissingPointerRequirement(String),
    /// A multi-pointer gesture must wait for its pointers to arrive.
    #[error("multi-pointer gesture `{0}` needs a non-zero recognition timeout")]
    ZeroRecognitionTimeout(String),
    /// A permutation string could not be parsed.
    #[error("gesture `{name}` has invalid permutation `{permutation}`: {source}")]
    InvalidPermutation {
        /// Gesture name.
        name: String,
        /// The permutation as written.
        permutation: String,
        /// Parse failure.
        source: PermutationError,
    },
    /// No gesture with this name is registered.
    #[error("no gesture named `{0}`")]
    UnknownGesture(String),
}

/// Internal-consistency failures. These indicate a programming defect.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// An event or call named a target the coordinator never issued.
    #[error("unknown {0}")]
    UnknownTarget(TargetId),
    /// The postponed queue did not start with the window's opening event.
    #[error("postponed queue of {target} starts with {found:?}, expected the window's opening event")]
    QueueInvariant {
        /// Target owning the queue.
        target: TargetId,
        /// Kind of the leading event, if any.
        found: Option<EventKind>,
    },
    /// An event was handed to a target it is not addressed to.
    #[error("event for {found} delivered to {expected}")]
    TargetMismatch {
        /// Target the caller delivered to.
        expected: TargetId,
        /// Target recorded on the event.
        found: TargetId,
    },
    /// The target state machine rejected a transition.
    #[error("{target}: transition {transition:?} is not valid from {from:?}")]
    InvalidTransition {
        /// Target whose state was changing.
        target: TargetId,
        /// Phase before the transition.
        from: TargetPhase,
        /// Requested transition.
        transition: Transition,
    },
}
