//! Rectangle geometry with NaN-safe construction.

use serde::{Deserialize, Serialize};

/// Axis-aligned mark rectangle in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Non-finite offsets become 0; non-finite or negative extents become 0.
    pub fn clamped(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: finite_or_zero(x),
            y: finite_or_zero(y),
            width: finite_or_zero(width).max(0.0),
            height: finite_or_zero(height).max(0.0),
        }
    }

    /// Rectangle covering `[x0, x1)` horizontally.
    pub fn span(x0: f64, x1: f64, y: f64, height: f64) -> Self {
        Self::clamped(x0, y, x1 - x0, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nan_start_collapses_to_origin() {
        let rect = Rect::span(f64::NAN, 120.0, 10.0, 20.0);
        assert_eq!(rect, Rect { x: 0.0, y: 10.0, width: 0.0, height: 20.0 });
        assert!(rect.is_empty());
    }

    #[test]
    fn reversed_span_has_zero_width() {
        let rect = Rect::span(50.0, 20.0, 0.0, 5.0);
        assert_eq!(rect.x, 50.0);
        assert_eq!(rect.width, 0.0);
    }

    #[test]
    fn negative_offsets_survive_panning() {
        let rect = Rect::clamped(-40.0, 0.0, 80.0, 10.0);
        assert_eq!(rect.x, -40.0);
        assert_eq!(rect.width, 80.0);
    }

    proptest! {
        #[test]
        fn clamped_never_yields_nan(
            x in prop::num::f64::ANY,
            y in prop::num::f64::ANY,
            w in prop::num::f64::ANY,
            h in prop::num::f64::ANY,
        ) {
            let rect = Rect::clamped(x, y, w, h);
            prop_assert!(rect.x.is_finite() && rect.y.is_finite());
            prop_assert!(rect.width.is_finite() && rect.width >= 0.0);
            prop_assert!(rect.height.is_finite() && rect.height >= 0.0);
        }
    }
}
