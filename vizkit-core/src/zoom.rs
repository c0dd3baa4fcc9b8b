//! Zoom/pan transform applied to a horizontal continuous axis.

use serde::{Deserialize, Serialize};

use crate::scale::LinearScale;

/// Scale-then-translate transform: `px' = px * k + x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    /// Clamps `k` into `extent`; a non-finite factor resets to 1.
    pub fn constrained(self, extent: (f64, f64)) -> Self {
        let k = if self.k.is_finite() {
            self.k.clamp(extent.0, extent.1)
        } else {
            1.0
        };
        Self {
            k,
            x: if self.x.is_finite() { self.x } else { 0.0 },
            y: if self.y.is_finite() { self.y } else { 0.0 },
        }
    }

    pub fn apply_x(&self, px: f64) -> f64 {
        px * self.k + self.x
    }

    pub fn invert_x(&self, px: f64) -> f64 {
        (px - self.x) / self.k
    }

    /// Scale whose domain is what the transformed view currently shows.
    pub fn rescale_x(&self, base: &LinearScale) -> LinearScale {
        let (r0, r1) = base.range();
        base.with_domain((
            base.invert(self.invert_x(r0)),
            base.invert(self.invert_x(r1)),
        ))
    }

    /// Multiplies `k` by `factor` keeping `pivot_x` fixed on screen.
    pub fn scale_around(&self, factor: f64, pivot_x: f64, extent: (f64, f64)) -> Self {
        let next = Self::new(self.k * factor, self.x, self.y).constrained(extent);
        let ratio = next.k / self.k;
        Self {
            x: pivot_x - (pivot_x - self.x) * ratio,
            ..next
        }
    }

    pub fn translate_by(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EXTENT: (f64, f64) = (0.5, 20.0);

    #[test]
    fn factors_outside_extent_are_clamped() {
        assert_eq!(ZoomTransform::new(0.3, 0.0, 0.0).constrained(EXTENT).k, 0.5);
        assert_eq!(ZoomTransform::new(50.0, 0.0, 0.0).constrained(EXTENT).k, 20.0);
        assert_eq!(ZoomTransform::new(3.0, 0.0, 0.0).constrained(EXTENT).k, 3.0);
        assert_eq!(ZoomTransform::new(f64::NAN, 0.0, 0.0).constrained(EXTENT).k, 1.0);
    }

    #[test]
    fn identity_rescale_keeps_domain() {
        let base = LinearScale::new((100.0, 200.0), (0.0, 500.0));
        assert_eq!(ZoomTransform::IDENTITY.rescale_x(&base), base);
    }

    #[test]
    fn scale_around_keeps_pivot_fixed() {
        let zoomed = ZoomTransform::IDENTITY.scale_around(2.0, 100.0, EXTENT);
        assert_eq!(zoomed.k, 2.0);
        assert_eq!(zoomed.apply_x(100.0), 100.0);

        let capped = zoomed.scale_around(100.0, 100.0, EXTENT);
        assert_eq!(capped.k, 20.0);
        assert!((capped.apply_x(100.0) - 100.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn rescaled_scale_matches_transformed_pixels(
            k in 0.5f64..20.0,
            x in -2000.0f64..2000.0,
            value in 0.0f64..1000.0,
        ) {
            let base = LinearScale::new((0.0, 1000.0), (0.0, 800.0));
            let transform = ZoomTransform::new(k, x, 0.0);
            let rescaled = transform.rescale_x(&base);
            let expected = transform.apply_x(base.map(value));
            prop_assert!((rescaled.map(value) - expected).abs() < 1e-6);
        }
    }
}
