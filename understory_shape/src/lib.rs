// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_shape --heading-base-level=0

//! Understory Shape: classify a finished stroke against polygon templates.
//!
//! ## Overview
//!
//! A stroke is an ordered list of points, for example the ink collected while a
//! pen gesture was running. Each [`ShapeTemplate`] is a polygon in unit-square
//! coordinates. To score a template, the polygon is scaled into the stroke's
//! bounding box (inflated by the template's padding, never less than
//! [`MIN_PADDING`](template::MIN_PADDING)) and the fraction of stroke points
//! inside it is counted with Kurbo's winding-number containment.
//!
//! Templates are tried in priority order. A template that reaches the minimum
//! fraction and beats the best qualified fraction so far is then checked
//! against its heuristic gates:
//!
//! - start-to-end compass [`Headings`],
//! - a ceiling for `height / width`,
//! - minimum and maximum path length, computed from the stroke size and
//!   optionally the target element's size. A bound that needs the target is
//!   skipped when no target size is given.
//!
//! A gate failure drops the template without raising the bar for the ones
//! after it.
//!
//! ## Default library
//!
//! `Line`, `Triangle`, `Diamond`, `Circle` (a 16-gon), `Rectangle`.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use understory_shape::{ShapeKind, ShapeQuery, classify};
//!
//! let square = [
//!     Point::new(0.0, 0.0),
//!     Point::new(50.0, 0.0),
//!     Point::new(100.0, 0.0),
//!     Point::new(100.0, 50.0),
//!     Point::new(100.0, 100.0),
//!     Point::new(50.0, 100.0),
//!     Point::new(0.0, 100.0),
//!     Point::new(0.0, 50.0),
//!     Point::new(0.0, 0.0),
//! ];
//! let m = classify(&square, &ShapeQuery::default()).unwrap();
//! assert_eq!(m.kind, ShapeKind::Rectangle);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod heading;
pub mod matcher;
pub mod template;

pub use heading::Headings;
pub use matcher::{GateFailure, ShapeMatch, ShapeMatcher, ShapeQuery, Stroke, classify};
pub use template::{LengthBound, LengthContext, ShapeKind, ShapeTemplate, default_templates};
