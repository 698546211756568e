// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape templates and the default template library.

use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, Size};

use crate::heading::Headings;

/// Padding used when a template asks for less.
///
/// Keeps stroke points that lie exactly on the bounding box edge inside the
/// scaled polygon.
pub const MIN_PADDING: f64 = 0.01;

/// Identifier of a template.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ShapeKind {
    /// A mostly horizontal straight stroke.
    Line,
    /// A closed triangle with its apex at the top.
    Triangle,
    /// A closed square rotated by 45 degrees.
    Diamond,
    /// A closed round stroke.
    Circle,
    /// A closed axis-aligned rectangle.
    Rectangle,
}

/// Dimensions a path-length bound may depend on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LengthContext {
    /// Bounding box size of the stroke.
    pub gesture: Size,
    /// Size of the element the stroke was drawn on, when known.
    pub target: Option<Size>,
}

/// A path-length bound. `None` skips the check.
pub type LengthBound = fn(&LengthContext) -> Option<f64>;

/// A normalized polygon with heuristic gates.
#[derive(Clone, Debug)]
pub struct ShapeTemplate {
    /// What the template recognizes.
    pub kind: ShapeKind,
    /// Polygon vertices in unit-square coordinates.
    pub polygon: Vec<Point>,
    /// Fraction of the stroke's size added around its bounding box before scaling.
    pub padding: f64,
    /// Accepted start-to-end headings; empty for any.
    pub headings: Headings,
    /// Ceiling for `height / width` of the stroke.
    pub max_height_ratio: Option<f64>,
    /// Minimum path length.
    pub min_length: Option<LengthBound>,
    /// Maximum path length.
    pub max_length: Option<LengthBound>,
}

impl ShapeTemplate {
    /// A template with no padding and no gates.
    pub fn new(kind: ShapeKind, polygon: impl Into<Vec<Point>>) -> Self {
        Self {
            kind,
            polygon: polygon.into(),
            padding: 0.0,
            headings: Headings::empty(),
            max_height_ratio: None,
            min_length: None,
            max_length: None,
        }
    }

    /// Set the padding fraction.
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Restrict the accepted headings.
    pub fn headings(mut self, headings: Headings) -> Self {
        self.headings = headings;
        self
    }

    /// Set the height ratio ceiling.
    pub fn max_height_ratio(mut self, ratio: f64) -> Self {
        self.max_height_ratio = Some(ratio);
        self
    }

    /// Set path-length bounds.
    pub fn length(mut self, min: Option<LengthBound>, max: Option<LengthBound>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Padding actually applied.
    pub fn effective_padding(&self) -> f64 {
        self.padding.max(MIN_PADDING)
    }

    /// The polygon scaled into `bounds`, inflated by the effective padding.
    ///
    /// A flat axis is padded by the other axis's extent so that straight
    /// strokes still have an area to fall into.
    pub fn scaled_into(&self, bounds: Rect) -> BezPath {
        let pad = self.effective_padding();
        let (w, h) = (bounds.width(), bounds.height());
        let long = w.max(h);
        let dx = pad * if w > 0.0 { w } else { long };
        let dy = pad * if h > 0.0 { h } else { long };
        let frame = bounds.inflate(dx, dy);
        let to_frame = Affine::translate(frame.origin().to_vec2())
            * Affine::scale_non_uniform(frame.width(), frame.height());

        let mut path = BezPath::new();
        let mut vertices = self.polygon.iter();
        if let Some(first) = vertices.next() {
            path.move_to(*first);
            for p in vertices {
                path.line_to(*p);
            }
            path.close_path();
        }
        to_frame * path
    }
}

/// The built-in library, in priority order.
pub fn default_templates() -> Vec<ShapeTemplate> {
    let unit_square = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    Vec::from([
        ShapeTemplate::new(ShapeKind::Line, unit_square)
            .padding(0.1)
            .headings(Headings::HORIZONTAL)
            .max_height_ratio(0.2)
            .length(Some(line_floor), Some(line_ceiling)),
        ShapeTemplate::new(
            ShapeKind::Triangle,
            [
                Point::new(0.5, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ],
        )
        .padding(0.08)
        .length(Some(perimeter_floor), Some(perimeter_ceiling)),
        ShapeTemplate::new(
            ShapeKind::Diamond,
            [
                Point::new(0.5, 0.0),
                Point::new(1.0, 0.5),
                Point::new(0.5, 1.0),
                Point::new(0.0, 0.5),
            ],
        )
        .padding(0.08)
        .length(Some(perimeter_floor), Some(perimeter_ceiling)),
        ShapeTemplate::new(ShapeKind::Circle, circle_polygon())
            .padding(0.05)
            .length(Some(perimeter_floor), Some(perimeter_ceiling)),
        ShapeTemplate::new(ShapeKind::Rectangle, unit_square)
            .length(Some(rectangle_floor), Some(perimeter_ceiling)),
    ])
}

fn line_floor(cx: &LengthContext) -> Option<f64> {
    Some(0.9 * cx.gesture.width)
}

// A line may not run far past the element it was drawn on.
fn line_ceiling(cx: &LengthContext) -> Option<f64> {
    cx.target.map(|t| 2.0 * t.width.max(t.height))
}

fn rectangle_floor(cx: &LengthContext) -> Option<f64> {
    Some(1.5 * (cx.gesture.width + cx.gesture.height))
}

fn perimeter_floor(cx: &LengthContext) -> Option<f64> {
    Some(cx.gesture.width + cx.gesture.height)
}

fn perimeter_ceiling(cx: &LengthContext) -> Option<f64> {
    Some(3.0 * (cx.gesture.width + cx.gesture.height))
}

/// A 16-gon inscribed in the unit square.
fn circle_polygon() -> Vec<Point> {
    // cos(k * 22.5°) for k = 0..=4.
    const C: [f64; 5] = [
        1.0,
        0.923_879_532_511_286_7,
        0.707_106_781_186_547_6,
        0.382_683_432_365_089_8,
        0.0,
    ];
    (0..16)
        .map(|k: usize| {
            // cos and sin of k * 22.5° from the first-quadrant table.
            let quadrant = k / 4;
            let i = k % 4;
            let (c, s) = (C[i], C[4 - i]);
            let (x, y) = match quadrant {
                0 => (c, s),
                1 => (-s, c),
                2 => (-c, -s),
                _ => (s, -c),
            };
            Point::new(0.5 + 0.5 * x, 0.5 + 0.5 * y)
        })
        .collect()
}
