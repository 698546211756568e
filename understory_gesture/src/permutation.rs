// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer-type permutations.
//!
//! A permutation is one acceptable combination of pointer types for a
//! gesture, written as `class[:count]` terms joined by `+`:
//!
//! ```
//! use understory_gesture::permutation::{Permutation, PointerClass};
//! let p: Permutation = "touch:2+pen".parse().unwrap();
//! assert_eq!(p.count(PointerClass::Touch), 2);
//! assert_eq!(p.count(PointerClass::Pen), 1);
//! assert_eq!(p.total(), 3);
//! ```
//!
//! `any:N` accepts exactly `N` pointers of types not named explicitly.

use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;

use crate::error::PermutationError;
use crate::types::PointerKind;

/// A pointer class as seen by the matcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PointerClass {
    /// Touch contact.
    Touch,
    /// Pen contact.
    Pen,
    /// Mouse button press.
    Mouse,
    /// Confirmed hover of a pen or mouse.
    Hover,
    /// Wildcard, only valid in permutations.
    Any,
}

impl PointerClass {
    /// Classes that occur in actual pointer counts, in a fixed order.
    pub const CONCRETE: [Self; 4] = [Self::Touch, Self::Pen, Self::Mouse, Self::Hover];

    /// Class of a contact by a pointer of `kind`.
    pub const fn of_contact(kind: PointerKind) -> Self {
        match kind {
            PointerKind::Touch => Self::Touch,
            PointerKind::Pen => Self::Pen,
            PointerKind::Mouse => Self::Mouse,
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Touch => 0,
            Self::Pen => 1,
            Self::Mouse => 2,
            Self::Hover => 3,
            Self::Any => 4,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Pen => "pen",
            Self::Mouse => "mouse",
            Self::Hover => "hover",
            Self::Any => "any",
        }
    }
}

impl FromStr for PointerClass {
    type Err = PermutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "touch" => Ok(Self::Touch),
            "pen" => Ok(Self::Pen),
            "mouse" => Ok(Self::Mouse),
            "hover" => Ok(Self::Hover),
            "any" => Ok(Self::Any),
            other => Err(PermutationError::UnknownClass(other.to_string())),
        }
    }
}

/// Actual number of active pointers per concrete class.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PointerCounts([u16; 4]);

impl PointerCounts {
    /// Count for `class`. `Any` yields the total.
    pub fn get(&self, class: PointerClass) -> u16 {
        match class {
            PointerClass::Any => self.total(),
            c => self.0[c.slot()],
        }
    }

    /// Add one pointer of `class`. `Any` is ignored.
    pub fn add(&mut self, class: PointerClass) {
        if class != PointerClass::Any {
            self.0[class.slot()] = self.0[class.slot()].saturating_add(1);
        }
    }

    /// Total number of pointers.
    pub fn total(&self) -> u16 {
        self.0.iter().copied().fold(0_u16, u16::saturating_add)
    }
}

/// Required pointer counts per class.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Permutation([u16; 5]);

impl Permutation {
    /// Required count for `class`.
    pub fn count(&self, class: PointerClass) -> u16 {
        self.0[class.slot()]
    }

    /// Total number of pointers this permutation requires.
    pub fn total(&self) -> u16 {
        self.0.iter().copied().fold(0_u16, u16::saturating_add)
    }

    /// Whether this permutation names `class` (or accepts anything via `any`).
    pub fn accepts(&self, class: PointerClass) -> bool {
        self.count(class) > 0 || self.count(PointerClass::Any) > 0
    }

    /// Whether `actual` satisfies this permutation exactly.
    ///
    /// Every named class must match its count, and pointers of classes the
    /// permutation does not name must be absorbed by `any`.
    pub fn is_satisfied_by(&self, actual: &PointerCounts) -> bool {
        let mut unclaimed = 0_u16;
        for class in PointerClass::CONCRETE {
            let required = self.count(class);
            let present = actual.get(class);
            if required > 0 {
                if required != present {
                    return false;
                }
            } else {
                unclaimed = unclaimed.saturating_add(present);
            }
        }
        unclaimed == self.count(PointerClass::Any)
    }

    /// Class a pointer of `class` is counted under by this permutation.
    pub fn claim(&self, class: PointerClass) -> PointerClass {
        if self.count(class) > 0 {
            class
        } else {
            PointerClass::Any
        }
    }
}

impl FromStr for Permutation {
    type Err = PermutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Self::default();
        for term in s.split('+') {
            let term = term.trim();
            if term.is_empty() {
                return Err(PermutationError::Empty);
            }
            let (class, count) = match term.split_once(':') {
                Some((class, count)) => {
                    let n: u16 = count
                        .trim()
                        .parse()
                        .map_err(|_| PermutationError::InvalidCount(count.to_string()))?;
                    if n == 0 {
                        return Err(PermutationError::InvalidCount(count.to_string()));
                    }
                    (class.trim().parse::<PointerClass>()?, n)
                }
                None => (term.parse::<PointerClass>()?, 1),
            };
            let slot = &mut out.0[class.slot()];
            *slot = slot.saturating_add(count);
        }
        Ok(out)
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for class in [
            PointerClass::Touch,
            PointerClass::Pen,
            PointerClass::Mouse,
            PointerClass::Hover,
            PointerClass::Any,
        ] {
            let n = self.count(class);
            if n == 0 {
                continue;
            }
            if !first {
                f.write_str("+")?;
            }
            first = false;
            if n == 1 {
                f.write_str(class.name())?;
            } else {
                write!(f, "{}:{}", class.name(), n)?;
            }
        }
        Ok(())
    }
}
