use gaze_core::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::jacobian::central_difference_jacobian;

/// Generic non-linear least squares problem with dense parameter/residual vectors.
///
/// Only residuals are mandatory; the default Jacobian uses central
/// differences with [`NllsProblem::jacobian_step`].
pub trait NllsProblem {
    /// Number of parameters in the optimization vector.
    fn num_params(&self) -> usize;
    /// Number of residual rows in the problem.
    fn num_residuals(&self) -> usize;

    /// Residuals for the given parameters.
    fn residuals(&self, x: &DVector<Real>) -> DVector<Real>;

    /// Relative step used by the finite-difference Jacobian.
    fn jacobian_step(&self) -> Real {
        1e-6
    }

    /// Jacobian of [`NllsProblem::residuals`] at `x`.
    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        central_difference_jacobian(|p| self.residuals(p), x, self.jacobian_step())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Maximum number of solver iterations before termination.
    ///
    /// The LM backend follows the MINPACK convention and caps residual
    /// evaluations at `max_iters * (n + 1)`.
    pub max_iters: usize,
    /// Relative tolerance on the objective (cost) reduction.
    pub ftol: Real,
    /// Orthogonality/gradient tolerance.
    pub gtol: Real,
    /// Relative tolerance on parameter updates.
    pub xtol: Real,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-12,
            gtol: 1e-12,
            xtol: 1e-12,
        }
    }
}

/// How a solver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveTermination {
    /// A tolerance was met or the residuals vanished.
    Converged,
    /// The evaluation budget ran out first.
    IterationLimit,
    /// The solver stopped without meeting a tolerance.
    Stalled,
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub iterations: usize,
    /// `0.5 * ||r||^2` at the returned parameters.
    pub final_cost: Real,
    pub termination: SolveTermination,
    /// Backend-specific termination detail.
    pub detail: String,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        self.termination == SolveTermination::Converged
    }
}

pub trait NllsSolverBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport);
}
