//! Bounded variable vectors.
//!
//! Calibration variables are a rectangular array of scalars (one row per
//! logical parameter) with an inclusive `[lower, upper]` interval per scalar.
//! The optimizer works on unconstrained internal coordinates `u` mapped onto
//! the interval by `x = lower + (upper - lower) * (1 + sin u) / 2`, so every
//! candidate it evaluates is feasible.

use gaze_core::Real;
use log::warn;
use nalgebra::DVector;

use crate::CalibrationError;

/// Free scalars, one row per logical parameter.
pub type VariableVector = Vec<Vec<Real>>;
/// Inclusive `(lower, upper)` interval for each scalar of a [`VariableVector`].
pub type BoundsArray = Vec<Vec<(Real, Real)>>;

// Initial values are kept this fraction of the interval width away from the
// ends; the sine map has a zero derivative exactly at a bound.
const INTERIOR_MARGIN: Real = 1e-6;

/// Validated shape of a variable vector and its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLayout {
    row_lens: Vec<usize>,
    lower: Vec<Real>,
    upper: Vec<Real>,
}

impl VariableLayout {
    /// Check that `initial` and `bounds` have the same shape and that every
    /// interval is well formed.
    pub fn new(initial: &VariableVector, bounds: &BoundsArray) -> Result<Self, CalibrationError> {
        if initial.len() != bounds.len() {
            return Err(CalibrationError::RowCountMismatch {
                values: initial.len(),
                bounds: bounds.len(),
            });
        }

        let mut row_lens = Vec::with_capacity(initial.len());
        let mut lower = Vec::new();
        let mut upper = Vec::new();
        for (row, (vals, bnds)) in initial.iter().zip(bounds).enumerate() {
            if vals.len() != bnds.len() {
                return Err(CalibrationError::RowLengthMismatch {
                    row,
                    values: vals.len(),
                    bounds: bnds.len(),
                });
            }
            for (col, (&value, &(lo, hi))) in vals.iter().zip(bnds).enumerate() {
                if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                    return Err(CalibrationError::InvalidBound {
                        row,
                        col,
                        lower: lo,
                        upper: hi,
                    });
                }
                if !value.is_finite() {
                    return Err(CalibrationError::NonFiniteInitial { row, col });
                }
                lower.push(lo);
                upper.push(hi);
            }
            row_lens.push(vals.len());
        }

        if lower.is_empty() {
            return Err(CalibrationError::NoVariables);
        }

        Ok(Self {
            row_lens,
            lower,
            upper,
        })
    }

    /// Total number of scalars.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Scalars whose interval has non-zero width.
    pub fn num_free(&self) -> usize {
        self.lower
            .iter()
            .zip(&self.upper)
            .filter(|(lo, hi)| hi > lo)
            .count()
    }

    pub fn num_rows(&self) -> usize {
        self.row_lens.len()
    }

    pub fn lower(&self) -> &[Real] {
        &self.lower
    }

    pub fn upper(&self) -> &[Real] {
        &self.upper
    }

    /// Row-major flattening of a vector with this layout's shape.
    pub fn flatten(&self, values: &VariableVector) -> DVector<Real> {
        DVector::from_iterator(self.dim(), values.iter().flatten().copied())
    }

    /// Inverse of [`VariableLayout::flatten`].
    pub fn unflatten(&self, flat: &DVector<Real>) -> VariableVector {
        let mut out = Vec::with_capacity(self.row_lens.len());
        let mut offset = 0;
        for &len in &self.row_lens {
            out.push(flat.rows(offset, len).iter().copied().collect());
            offset += len;
        }
        out
    }

    pub fn contains(&self, flat: &DVector<Real>) -> bool {
        flat.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .all(|(&x, (&lo, &hi))| lo <= x && x <= hi)
    }

    /// Clamp into the bounds.
    pub fn clamp(&self, flat: &DVector<Real>) -> DVector<Real> {
        DVector::from_iterator(
            self.dim(),
            flat.iter()
                .zip(self.lower.iter().zip(&self.upper))
                .map(|(&x, (&lo, &hi))| x.clamp(lo, hi)),
        )
    }

    /// Internal coordinates for external values.
    ///
    /// Values outside their interval are clamped (with a warning) and every
    /// value is moved strictly inside its interval.
    pub fn to_internal(&self, flat: &DVector<Real>) -> DVector<Real> {
        DVector::from_iterator(
            self.dim(),
            (0..self.dim()).map(|i| {
                let (lo, hi) = (self.lower[i], self.upper[i]);
                let width = hi - lo;
                if width <= 0.0 {
                    return 0.0;
                }
                let x = flat[i];
                if x < lo || x > hi {
                    warn!("initial value {x} outside [{lo}, {hi}] (index {i}); clamping");
                }
                let margin = INTERIOR_MARGIN * width;
                let x = x.clamp(lo + margin, hi - margin);
                (2.0 * (x - lo) / width - 1.0).clamp(-1.0, 1.0).asin()
            }),
        )
    }

    /// External values for internal coordinates; always within bounds.
    pub fn to_external(&self, internal: &DVector<Real>) -> DVector<Real> {
        DVector::from_iterator(
            self.dim(),
            (0..self.dim()).map(|i| {
                let (lo, hi) = (self.lower[i], self.upper[i]);
                let x = lo + (hi - lo) * 0.5 * (1.0 + internal[i].sin());
                x.clamp(lo, hi)
            }),
        )
    }
}
