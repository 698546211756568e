// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compass headings of strokes.

use kurbo::{Point, Vec2};

bitflags::bitflags! {
    /// Set of compass headings, in screen coordinates (`N` points toward negative y).
    ///
    /// An empty set means any heading is acceptable.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Headings: u8 {
        /// Up.
        const N  = 1 << 0;
        /// Up and right.
        const NE = 1 << 1;
        /// Right.
        const E  = 1 << 2;
        /// Down and right.
        const SE = 1 << 3;
        /// Down.
        const S  = 1 << 4;
        /// Down and left.
        const SW = 1 << 5;
        /// Left.
        const W  = 1 << 6;
        /// Up and left.
        const NW = 1 << 7;
        /// Either horizontal direction.
        const HORIZONTAL = Self::E.bits() | Self::W.bits();
        /// Either vertical direction.
        const VERTICAL = Self::N.bits() | Self::S.bits();
    }
}

// tan(22.5°): boundary between a cardinal and a diagonal octant.
const TAN_OCTANT: f64 = 0.414_213_562_373_095_1;

impl Headings {
    /// Heading of the displacement `v`, or `None` for a zero vector.
    pub fn of_vector(v: Vec2) -> Option<Self> {
        let (ax, ay) = (v.x.max(-v.x), v.y.max(-v.y));
        if ax == 0.0 && ay == 0.0 {
            return None;
        }
        let heading = if ay <= TAN_OCTANT * ax {
            if v.x > 0.0 { Self::E } else { Self::W }
        } else if ax <= TAN_OCTANT * ay {
            if v.y > 0.0 { Self::S } else { Self::N }
        } else {
            match (v.x > 0.0, v.y > 0.0) {
                (true, true) => Self::SE,
                (true, false) => Self::NE,
                (false, true) => Self::SW,
                (false, false) => Self::NW,
            }
        };
        Some(heading)
    }

    /// Overall start-to-end heading of a stroke.
    pub fn of_stroke(points: &[Point]) -> Option<Self> {
        let (first, last) = (points.first()?, points.last()?);
        Self::of_vector(*last - *first)
    }

    /// Whether a stroke heading passes this gate.
    ///
    /// An empty gate accepts anything, including a stroke with no heading.
    pub fn admits(self, heading: Option<Self>) -> bool {
        self.is_empty() || heading.is_some_and(|h| self.intersects(h))
    }
}
