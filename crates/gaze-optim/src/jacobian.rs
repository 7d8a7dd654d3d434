//! Finite-difference Jacobians for residual functions without derivatives.

use gaze_core::Real;
use nalgebra::{DMatrix, DVector};

/// Central-difference Jacobian of `f` at `x`.
///
/// The step for parameter `j` is `rel_step * max(|x_j|, 1)`. Non-finite
/// entries are replaced by zero so a locally undefined residual cannot poison
/// the normal equations.
pub fn central_difference_jacobian<F>(f: F, x: &DVector<Real>, rel_step: Real) -> DMatrix<Real>
where
    F: Fn(&DVector<Real>) -> DVector<Real>,
{
    let r0 = f(x);
    let mut jac = DMatrix::zeros(r0.len(), x.len());
    let mut probe = x.clone();
    for j in 0..x.len() {
        let h = rel_step * x[j].abs().max(1.0);
        probe[j] = x[j] + h;
        let r_plus = f(&probe);
        probe[j] = x[j] - h;
        let r_minus = f(&probe);
        probe[j] = x[j];

        for i in 0..r0.len() {
            let d = (r_plus[i] - r_minus[i]) / (2.0 * h);
            jac[(i, j)] = if d.is_finite() { d } else { 0.0 };
        }
    }
    jac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_analytic_jacobian() {
        let f = |x: &DVector<Real>| {
            DVector::from_vec(vec![x[0] * x[0] + x[1], x[0].sin() * x[1], x[1].exp()])
        };
        let x = DVector::from_vec(vec![0.7, -1.3]);
        let jac = central_difference_jacobian(f, &x, 1e-6);

        let expected = DMatrix::from_row_slice(
            3,
            2,
            &[
                2.0 * x[0],
                1.0,
                x[0].cos() * x[1],
                x[0].sin(),
                0.0,
                x[1].exp(),
            ],
        );
        let err = (jac - expected).abs().max();
        assert!(err < 1e-8, "jacobian error {err}");
    }
}
