// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classification of a finished stroke against a template library.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Shape, Size};

use crate::heading::Headings;
use crate::template::{LengthContext, ShapeKind, ShapeTemplate, default_templates};

/// Matching parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeQuery<'a> {
    /// Minimum fraction of stroke points that must fall inside a template.
    pub min_match: f64,
    /// Size of the element the stroke was drawn on, for target-relative length bounds.
    pub target: Option<Size>,
    /// Only consider these kinds.
    pub only: Option<&'a [ShapeKind]>,
}

impl Default for ShapeQuery<'_> {
    fn default() -> Self {
        Self {
            min_match: 0.8,
            target: None,
            only: None,
        }
    }
}

/// A recognized shape.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeMatch {
    /// Winning template.
    pub kind: ShapeKind,
    /// Fraction of stroke points inside the winning template.
    pub fraction: f64,
}

/// Why a template was disqualified after meeting the containment threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GateFailure {
    /// The stroke's start-to-end heading is not accepted.
    Heading,
    /// The stroke is too tall for its width.
    HeightRatio,
    /// The stroke is shorter than the minimum path length.
    TooShort,
    /// The stroke is longer than the maximum path length.
    TooLong,
}

/// Measurements of a stroke shared by every template.
#[derive(Clone, Debug)]
pub struct Stroke<'a> {
    points: &'a [Point],
    bounds: Rect,
    length: f64,
    heading: Option<Headings>,
}

impl<'a> Stroke<'a> {
    /// Measure a stroke. `None` for fewer than two points or a single-point extent.
    pub fn new(points: &'a [Point]) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        if rest.is_empty() {
            return None;
        }
        let bounds = rest
            .iter()
            .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p));
        if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
            return None;
        }
        let length = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        Some(Self {
            points,
            bounds,
            length,
            heading: Headings::of_stroke(points),
        })
    }

    /// Bounding box.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Sum of segment lengths.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Start-to-end heading, if the stroke does not end where it started.
    pub fn heading(&self) -> Option<Headings> {
        self.heading
    }

    /// Fraction of points inside `template` scaled to this stroke.
    pub fn containment(&self, template: &ShapeTemplate) -> f64 {
        let path = template.scaled_into(self.bounds);
        let inside = self.points.iter().filter(|p| path.contains(**p)).count();
        #[allow(
            clippy::cast_precision_loss,
            reason = "Stroke point counts are far below 2^52."
        )]
        let fraction = inside as f64 / self.points.len() as f64;
        fraction
    }

    /// Run the heuristic gates of `template`.
    pub fn check_gates(&self, template: &ShapeTemplate, target: Option<Size>) -> Result<(), GateFailure> {
        if !template.headings.admits(self.heading) {
            return Err(GateFailure::Heading);
        }
        let size = self.bounds.size();
        if let Some(max) = template.max_height_ratio {
            // A zero-width stroke has an unbounded ratio.
            if size.width <= 0.0 || size.height / size.width > max {
                return Err(GateFailure::HeightRatio);
            }
        }
        let cx = LengthContext {
            gesture: size,
            target,
        };
        if template
            .min_length
            .and_then(|f| f(&cx))
            .is_some_and(|min| self.length < min)
        {
            return Err(GateFailure::TooShort);
        }
        if template
            .max_length
            .and_then(|f| f(&cx))
            .is_some_and(|max| self.length > max)
        {
            return Err(GateFailure::TooLong);
        }
        Ok(())
    }
}

/// A template library.
#[derive(Clone, Debug)]
pub struct ShapeMatcher {
    templates: Vec<ShapeTemplate>,
}

impl Default for ShapeMatcher {
    fn default() -> Self {
        Self::new(default_templates())
    }
}

impl ShapeMatcher {
    /// A matcher over `templates`, tried in order.
    pub fn new(templates: Vec<ShapeTemplate>) -> Self {
        Self { templates }
    }

    /// Templates in priority order.
    pub fn templates(&self) -> &[ShapeTemplate] {
        &self.templates
    }

    /// Classify a stroke.
    ///
    /// A template becomes a candidate when its containment fraction reaches
    /// `query.min_match` and beats the best qualified fraction so far. A
    /// candidate that fails a gate is dropped without raising the bar for
    /// later templates.
    pub fn classify(&self, points: &[Point], query: &ShapeQuery<'_>) -> Option<ShapeMatch> {
        let stroke = Stroke::new(points)?;
        let mut best: Option<ShapeMatch> = None;
        for template in &self.templates {
            if query.only.is_some_and(|only| !only.contains(&template.kind)) {
                continue;
            }
            let fraction = stroke.containment(template);
            let best_fraction = best.map_or(0.0, |m| m.fraction);
            if fraction < query.min_match || fraction <= best_fraction {
                continue;
            }
            match stroke.check_gates(template, query.target) {
                Ok(()) => {
                    best = Some(ShapeMatch {
                        kind: template.kind,
                        fraction,
                    });
                }
                Err(_failure) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(
                        target: "understory_shape",
                        kind = ?template.kind,
                        fraction,
                        failure = ?_failure,
                        "gate rejected template"
                    );
                }
            }
        }
        best
    }
}

/// Classify `points` against the default library.
pub fn classify(points: &[Point], query: &ShapeQuery<'_>) -> Option<ShapeMatch> {
    ShapeMatcher::default().classify(points, query)
}
