// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the engine: pointer identity, handles, outcomes, and lookups.
//!
//! ## Overview
//!
//! These types describe the engine's inputs and outputs.
//! They are referenced by the [`coordinator`](crate::coordinator) and used by hosts.

use core::fmt;

/// Physical pointer type reported by the platform input layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PointerKind {
    /// Stylus or pen.
    Pen,
    /// Finger on a touch surface.
    Touch,
    /// Mouse or trackpad cursor.
    Mouse,
}

impl PointerKind {
    /// Whether this pointer type can report proximity without contact.
    pub const fn supports_hover(self) -> bool {
        matches!(self, Self::Pen | Self::Mouse)
    }

    /// Lower-case name used in permutation strings and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Touch => "touch",
            Self::Mouse => "mouse",
        }
    }
}

/// Identifier for a physical pointer.
///
/// Stable for the lifetime of a physical pointer of a given type. Two pointers
/// of different kinds never compare equal, even with the same raw id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PointerId {
    /// Pointer type.
    pub kind: PointerKind,
    /// Platform-assigned identifier, unique within `kind`.
    pub raw: u64,
}

impl PointerId {
    /// Create a pointer identifier.
    pub const fn new(kind: PointerKind, raw: u64) -> Self {
        Self { kind, raw }
    }

    /// Shorthand for a touch pointer.
    pub const fn touch(raw: u64) -> Self {
        Self::new(PointerKind::Touch, raw)
    }

    /// Shorthand for a pen pointer.
    pub const fn pen(raw: u64) -> Self {
        Self::new(PointerKind::Pen, raw)
    }

    /// Shorthand for a mouse pointer.
    pub const fn mouse(raw: u64) -> Self {
        Self::new(PointerKind::Mouse, raw)
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.name(), self.raw)
    }
}

bitflags::bitflags! {
    /// Pressed buttons of a pointer sample.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u16 {
        /// Primary button, finger contact, or pen tip.
        const PRIMARY   = 0b0000_0001;
        /// Secondary button or pen barrel button.
        const SECONDARY = 0b0000_0010;
        /// Auxiliary (middle) button.
        const AUXILIARY = 0b0000_0100;
        /// Pen eraser.
        const ERASER    = 0b0010_0000;
    }
}

/// Handle of an interactive surface element registered with a coordinator.
///
/// Issued once by [`Coordinator::add_surface`](crate::coordinator::Coordinator::add_surface)
/// or [`Coordinator::add_target`](crate::coordinator::Coordinator::add_target).
/// Handles are never reused, even after the host stops routing events to them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TargetId(pub(crate) u32);

impl TargetId {
    /// Raw index of this handle.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Handle of a registered gesture.
///
/// A slot index and a generation counter, like the box tree's `NodeId`:
/// a removed gesture's handle becomes stale and never aliases a gesture
/// registered later into the same slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GestureId(pub(crate) u32, pub(crate) u32);

impl GestureId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// Propagation decision returned for every inbound event.
///
/// A host dispatcher walks the element path and uses this to decide whether
/// to keep delivering the raw event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Let the event continue to bubble.
    Continue,
    /// Stop propagation to ancestors; peer listeners on the same element still run.
    Stop,
    /// Stop immediately: the event was postponed or consumed by a gesture.
    StopAndConsume,
}

/// Look up the parent of a target to find where replayed events go.
pub trait ParentLookup<K> {
    /// Returns the parent of `node`, or `None` if `node` is a root surface.
    fn parent_of(&self, node: &K) -> Option<K>;
}
