//! Density response curve: maps a population density ratio to a bite-rate
//! multiplier.
//!
//! The curve is a piecewise-linear table of control points sorted by
//! density ratio. Inputs below the first point or above the last are
//! clamped to that point's effect (flat extrapolation). A control point's
//! own `x` always yields its `y` exactly, with no interpolation error.

use crate::CurveError;

/// One control point of the curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    /// Population density divided by normal density.
    pub density_ratio: f64,
    /// Bite-rate multiplier at that ratio.
    pub effect: f64,
}

impl CurvePoint {
    /// Construct a control point.
    pub const fn new(density_ratio: f64, effect: f64) -> Self {
        Self {
            density_ratio,
            effect,
        }
    }
}

/// An immutable, sorted density response table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityResponseCurve {
    points: Vec<CurvePoint>,
}

impl DensityResponseCurve {
    /// Build a curve from unsorted control points.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::NonFinite`] if any coordinate is NaN or infinite.
    pub fn from_points(mut points: Vec<CurvePoint>) -> Result<Self, CurveError> {
        if let Some(bad) = points
            .iter()
            .find(|p| !p.density_ratio.is_finite() || !p.effect.is_finite())
        {
            return Err(CurveError::NonFinite {
                density_ratio: bad.density_ratio,
                effect: bad.effect,
            });
        }
        points.sort_by(|a, b| a.density_ratio.total_cmp(&b.density_ratio));
        Ok(Self { points })
    }

    /// Build a curve from `(density_ratio, effect)` pairs.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Result<Self, CurveError> {
        Self::from_points(
            pairs
                .iter()
                .map(|&[density_ratio, effect]| CurvePoint::new(density_ratio, effect))
                .collect(),
        )
    }

    /// Build a curve from a table that must be present.
    ///
    /// A wholly missing table is fatal for the aggregate model; an empty one
    /// is allowed and evaluates to `1.0` everywhere.
    pub fn require(pairs: Option<&[[f64; 2]]>) -> Result<Self, CurveError> {
        pairs.map_or(Err(CurveError::Missing), Self::from_pairs)
    }

    /// The sorted control points.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Whether the table has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluate the curve at `x`.
    pub fn lookup(&self, x: f64) -> f64 {
        let Some(first) = self.points.first() else {
            return 1.0;
        };
        if x.is_nan() || x <= first.density_ratio {
            return first.effect;
        }

        // Smallest i with x <= x_i.
        let Some(upper_index) = self.points.iter().position(|p| x <= p.density_ratio) else {
            return self.points.last().map_or(1.0, |p| p.effect);
        };
        let Some(upper) = self.points.get(upper_index) else {
            return 1.0;
        };
        if x >= upper.density_ratio {
            return upper.effect;
        }
        let lower = upper_index
            .checked_sub(1)
            .and_then(|i| self.points.get(i))
            .unwrap_or(upper);

        // x lies strictly between the two ratios, so the span is positive.
        let span = upper.density_ratio - lower.density_ratio;
        if span <= 0.0 {
            return upper.effect;
        }
        let t = (x - lower.density_ratio) / span;
        lower.effect + t * (upper.effect - lower.effect)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn sample() -> DensityResponseCurve {
        DensityResponseCurve::from_pairs(&[[2.0, 1.5], [0.0, 0.0], [1.0, 1.0], [4.0, 1.8]])
            .unwrap()
    }

    #[test]
    fn points_are_sorted_on_load() {
        let ratios: Vec<f64> = sample().points().iter().map(|p| p.density_ratio).collect();
        assert_eq!(ratios, vec![0.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn control_points_are_exact() {
        let curve = sample();
        for point in curve.points() {
            assert_eq!(curve.lookup(point.density_ratio), point.effect);
        }
    }

    #[test]
    fn flat_outside_the_table() {
        let curve = sample();
        assert_eq!(curve.lookup(-3.0), 0.0);
        assert_eq!(curve.lookup(10.0), 1.8);
    }

    #[test]
    fn interpolates_linearly() {
        let curve = sample();
        assert!((curve.lookup(0.5) - 0.5).abs() < 1e-12);
        assert!((curve.lookup(3.0) - 1.65).abs() < 1e-12);
    }

    #[test]
    fn monotone_between_monotone_points() {
        let curve = sample();
        let mut previous = curve.lookup(0.0);
        for step in 1..=400 {
            let x = f64::from(step) * 0.01;
            let y = curve.lookup(x);
            assert!(y >= previous, "curve decreased at {x}");
            previous = y;
        }
    }

    #[test]
    fn empty_table_is_neutral() {
        let curve = DensityResponseCurve::from_pairs(&[]).unwrap();
        assert!(curve.is_empty());
        assert_eq!(curve.lookup(0.7), 1.0);
    }

    #[test]
    fn missing_and_non_finite_tables_rejected() {
        assert!(matches!(
            DensityResponseCurve::require(None),
            Err(CurveError::Missing)
        ));
        assert!(matches!(
            DensityResponseCurve::from_pairs(&[[f64::NAN, 1.0]]),
            Err(CurveError::NonFinite { .. })
        ));
        assert!(DensityResponseCurve::require(Some(&[[1.0, 1.0]][..])).is_ok());
    }
}
