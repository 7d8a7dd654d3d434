//! Generic bounded calibration of a parameterized estimator.
//!
//! The engine never inspects the parameter type. It moves a flat
//! [`VariableVector`] inside its [`BoundsArray`], writes candidates into a
//! copy of the base parameters through the caller's applicator, runs the
//! estimator on every sample and compares the reduced output with the
//! sample's target. The fitted values are returned with the same shape as the
//! initial values; turning them into parameters is left to the caller.

use std::fmt;

use gaze_core::{Pt3, Real};
use log::{debug, info, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::{
    BoundsArray, CalibrationError, LmBackend, NllsProblem, NllsSolverBackend, RobustKernel,
    SolveOptions, SolveTermination, VariableLayout, VariableVector,
};

/// Anything that turns one observation plus parameters into one estimate.
pub trait Estimator<P, O> {
    type Output;
    type Error: fmt::Display;

    fn estimate(&self, observation: &O, params: &P) -> Result<Self::Output, Self::Error>;
}

/// Observation paired with its true target, expressed in the frame the
/// reducer produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample<O> {
    pub observation: O,
    pub target: Pt3,
}

impl<O> CalibrationSample<O> {
    pub fn new(observation: O, target: Pt3) -> Self {
        Self {
            observation,
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOptions {
    pub solve: SolveOptions,
    /// Relative finite-difference step in internal coordinates.
    pub jacobian_step: Real,
    /// Residual (per component) charged to a sample that fails at a candidate.
    pub failure_penalty: Real,
    pub robust: RobustKernel,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            solve: SolveOptions {
                max_iters: 100,
                ftol: 1e-10,
                gtol: 1e-10,
                xtol: 1e-10,
            },
            jacobian_step: 1e-6,
            failure_penalty: 100.0,
            robust: RobustKernel::None,
        }
    }
}

/// How the search ended. Anything but `Converged` still carries the best
/// candidate found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationStatus {
    Converged,
    IterationLimit,
    Stalled,
}

impl From<SolveTermination> for CalibrationStatus {
    fn from(t: SolveTermination) -> Self {
        match t {
            SolveTermination::Converged => CalibrationStatus::Converged,
            SolveTermination::IterationLimit => CalibrationStatus::IterationLimit,
            SolveTermination::Stalled => CalibrationStatus::Stalled,
        }
    }
}

/// Sample dropped before optimization because it failed at the initial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedSample {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Mean squared Euclidean error over the used samples at the start.
    pub initial_mse: Real,
    pub final_mse: Real,
    pub final_rms: Real,
    /// Residual evaluations spent by the solver.
    pub evaluations: usize,
    pub used_samples: Vec<usize>,
    pub excluded_samples: Vec<ExcludedSample>,
    /// Used samples that fail at the returned values.
    pub failed_samples: Vec<usize>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationOutcome {
    /// Fitted values, same shape as the initial values and within bounds.
    pub values: VariableVector,
    pub status: CalibrationStatus,
    pub report: CalibrationReport,
}

impl CalibrationOutcome {
    pub fn converged(&self) -> bool {
        self.status == CalibrationStatus::Converged
    }
}

/// Bounded Levenberg-Marquardt calibration engine.
#[derive(Debug, Clone, Default)]
pub struct GenericCalibration {
    pub options: CalibrationOptions,
}

impl GenericCalibration {
    pub fn new(options: CalibrationOptions) -> Self {
        Self { options }
    }

    /// Fit `initial` within `bounds` so that `reducer(estimate(sample))`
    /// matches each sample's target.
    ///
    /// `applicator` receives a fresh clone of `base` for every candidate.
    #[allow(clippy::too_many_arguments)]
    pub fn calibrate<E, P, O, A, F>(
        &self,
        estimator: &E,
        base: &P,
        applicator: A,
        reducer: F,
        samples: &[CalibrationSample<O>],
        initial: &VariableVector,
        bounds: &BoundsArray,
    ) -> Result<CalibrationOutcome, CalibrationError>
    where
        E: Estimator<P, O>,
        P: Clone,
        A: Fn(P, &VariableVector) -> P,
        F: Fn(&E::Output) -> Result<Pt3, E::Error>,
    {
        if samples.is_empty() {
            return Err(CalibrationError::NoSamples);
        }
        let layout = VariableLayout::new(initial, bounds)?;

        let mut problem = CalibrationProblem {
            estimator,
            base,
            applicator: &applicator,
            reducer: &reducer,
            samples,
            used: Vec::new(),
            layout: &layout,
            options: &self.options,
        };

        let u0 = layout.to_internal(&layout.flatten(initial));
        let x0 = layout.to_external(&u0);

        let params0 = problem.params_at(&x0);
        let mut excluded = Vec::new();
        for (index, sample) in samples.iter().enumerate() {
            match problem.error_vector(&params0, sample) {
                Ok(_) => problem.used.push(index),
                Err(reason) => {
                    warn!("excluding calibration sample {index}: {reason}");
                    excluded.push(ExcludedSample { index, reason });
                }
            }
        }
        if problem.used.is_empty() {
            return Err(CalibrationError::NoUsableSamples(samples.len()));
        }

        let start = problem.evaluate(&x0);
        debug!(
            "calibrating {} variables ({} free) on {} samples, initial mse {:.6e}",
            layout.dim(),
            layout.num_free(),
            problem.used.len(),
            start.mse()
        );

        let (mut x_best, mut best, status, evaluations, detail) = if layout.num_free() == 0 {
            (
                x0.clone(),
                start.clone(),
                CalibrationStatus::Converged,
                0,
                "all variables fixed".to_string(),
            )
        } else {
            let (u_opt, report) = LmBackend.solve(&problem, u0, &self.options.solve);
            let x_opt = layout.clamp(&layout.to_external(&u_opt));
            let eval = problem.evaluate(&x_opt);
            (
                x_opt,
                eval,
                report.termination.into(),
                report.iterations,
                report.detail,
            )
        };

        let improved = best.cost() <= start.cost();
        if !improved {
            debug!(
                "solver ended at a worse cost ({:.6e} > {:.6e}); keeping the initial values",
                best.cost(),
                start.cost()
            );
            x_best = x0;
            best = start.clone();
        }

        let final_mse = best.mse();
        info!(
            "calibration finished: {:?} after {} evaluations, mse {:.6e} -> {:.6e}",
            status,
            evaluations,
            start.mse(),
            final_mse
        );
        if status != CalibrationStatus::Converged {
            warn!("calibration did not converge ({detail}); returning best values found");
        }

        Ok(CalibrationOutcome {
            values: layout.unflatten(&x_best),
            status,
            report: CalibrationReport {
                initial_mse: start.mse(),
                final_mse,
                final_rms: final_mse.sqrt(),
                evaluations,
                used_samples: problem.used.clone(),
                excluded_samples: excluded,
                failed_samples: best.failed,
                detail,
            },
        })
    }
}

#[derive(Debug, Clone)]
struct Evaluation {
    residuals: DVector<Real>,
    sq_errors: Vec<Real>,
    failed: Vec<usize>,
}

impl Evaluation {
    fn cost(&self) -> Real {
        0.5 * self.residuals.norm_squared()
    }

    fn mse(&self) -> Real {
        if self.sq_errors.is_empty() {
            return Real::NAN;
        }
        self.sq_errors.iter().sum::<Real>() / self.sq_errors.len() as Real
    }
}

struct CalibrationProblem<'a, E, P, O, A, F> {
    estimator: &'a E,
    base: &'a P,
    applicator: &'a A,
    reducer: &'a F,
    samples: &'a [CalibrationSample<O>],
    used: Vec<usize>,
    layout: &'a VariableLayout,
    options: &'a CalibrationOptions,
}

impl<E, P, O, A, F> CalibrationProblem<'_, E, P, O, A, F>
where
    E: Estimator<P, O>,
    P: Clone,
    A: Fn(P, &VariableVector) -> P,
    F: Fn(&E::Output) -> Result<Pt3, E::Error>,
{
    fn params_at(&self, x: &DVector<Real>) -> P {
        (self.applicator)(self.base.clone(), &self.layout.unflatten(x))
    }

    fn error_vector(
        &self,
        params: &P,
        sample: &CalibrationSample<O>,
    ) -> Result<nalgebra::Vector3<Real>, String> {
        let output = self
            .estimator
            .estimate(&sample.observation, params)
            .map_err(|e| e.to_string())?;
        let reduced = (self.reducer)(&output).map_err(|e| e.to_string())?;
        let err = reduced - sample.target;
        if err.iter().all(|v| v.is_finite()) {
            Ok(err)
        } else {
            Err("non-finite estimate".to_string())
        }
    }

    fn evaluate(&self, x: &DVector<Real>) -> Evaluation {
        let params = self.params_at(x);
        let mut residuals = DVector::zeros(self.num_residuals());
        let mut sq_errors = Vec::with_capacity(self.used.len());
        let mut failed = Vec::new();

        for (row, &index) in self.used.iter().enumerate() {
            let block = match self.error_vector(&params, &self.samples[index]) {
                Ok(err) => {
                    let norm = err.norm();
                    sq_errors.push(norm * norm);
                    err * self.options.robust.row_scale(norm)
                }
                Err(reason) => {
                    debug!("sample {index} failed at candidate: {reason}");
                    failed.push(index);
                    nalgebra::Vector3::repeat(self.options.failure_penalty)
                }
            };
            residuals.fixed_rows_mut::<3>(3 * row).copy_from(&block);
        }

        Evaluation {
            residuals,
            sq_errors,
            failed,
        }
    }
}

impl<E, P, O, A, F> NllsProblem for CalibrationProblem<'_, E, P, O, A, F>
where
    E: Estimator<P, O>,
    P: Clone,
    A: Fn(P, &VariableVector) -> P,
    F: Fn(&E::Output) -> Result<Pt3, E::Error>,
{
    fn num_params(&self) -> usize {
        self.layout.dim()
    }

    // LM needs at least as many rows as parameters; extra rows stay zero.
    fn num_residuals(&self) -> usize {
        (3 * self.used.len()).max(self.layout.dim())
    }

    fn residuals(&self, u: &DVector<Real>) -> DVector<Real> {
        self.evaluate(&self.layout.to_external(u)).residuals
    }

    fn jacobian_step(&self) -> Real {
        self.options.jacobian_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Line {
        gain: Real,
        offset: Real,
    }

    struct LineEstimator;

    impl Estimator<Line, Real> for LineEstimator {
        type Output = Pt3;
        type Error = String;

        fn estimate(&self, x: &Real, p: &Line) -> Result<Pt3, String> {
            if *x < 0.0 {
                return Err(format!("negative input {x}"));
            }
            Ok(Pt3::new(p.gain * x + p.offset, 0.5 * p.gain * x, 0.0))
        }
    }

    const TRUE_GAIN: Real = 2.5;
    const TRUE_OFFSET: Real = 0.3;

    fn sample(x: Real) -> CalibrationSample<Real> {
        let truth = Line {
            gain: TRUE_GAIN,
            offset: TRUE_OFFSET,
        };
        let target = LineEstimator.estimate(&x.abs(), &truth).unwrap();
        CalibrationSample::new(x, target)
    }

    fn base() -> Line {
        Line {
            gain: 1.0,
            offset: TRUE_OFFSET,
        }
    }

    fn gain_only(mut p: Line, v: &VariableVector) -> Line {
        p.gain = v[0][0];
        p
    }

    fn gain_and_offset(mut p: Line, v: &VariableVector) -> Line {
        p.gain = v[0][0];
        p.offset = v[1][0];
        p
    }

    fn identity(p: &Pt3) -> Result<Pt3, String> {
        Ok(*p)
    }

    #[test]
    fn single_free_parameter_converges_from_single_sample() {
        let outcome = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_only,
                identity,
                &[sample(2.0)],
                &vec![vec![1.0]],
                &vec![vec![(0.0, 10.0)]],
            )
            .unwrap();

        let gain = outcome.values[0][0];
        assert!((gain - TRUE_GAIN).abs() < 1e-6, "gain {gain}");
        assert!(outcome.converged(), "{:?}", outcome.report);
        assert!(outcome.report.final_mse < 1e-10);
        assert!(outcome.report.initial_mse > outcome.report.final_mse);
    }

    #[test]
    fn fitted_values_stay_inside_bounds() {
        let samples = [sample(1.0), sample(3.0)];
        let configs = [(0.0, 1.0), (3.0, 4.0), (-1.0, 2.4), (2.0, 3.0)];
        for (lo, hi) in configs {
            let initial = vec![vec![0.5 * (lo + hi)]];
            let outcome = GenericCalibration::default()
                .calibrate(
                    &LineEstimator,
                    &base(),
                    gain_only,
                    identity,
                    &samples,
                    &initial,
                    &vec![vec![(lo, hi)]],
                )
                .unwrap();
            let gain = outcome.values[0][0];
            assert!(lo <= gain && gain <= hi, "gain {gain} outside [{lo}, {hi}]");

            let nearest = TRUE_GAIN.clamp(lo, hi);
            assert!(
                (gain - nearest).abs() < 0.05,
                "gain {gain} far from {nearest} in [{lo}, {hi}]"
            );
        }
    }

    #[test]
    fn failing_samples_are_excluded_up_front() {
        let outcome = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_only,
                identity,
                &[sample(-1.0), sample(2.0)],
                &vec![vec![1.0]],
                &vec![vec![(0.0, 10.0)]],
            )
            .unwrap();

        assert_eq!(outcome.report.used_samples, vec![1]);
        assert_eq!(outcome.report.excluded_samples.len(), 1);
        assert_eq!(outcome.report.excluded_samples[0].index, 0);
        assert!(outcome.report.failed_samples.is_empty());
        assert!((outcome.values[0][0] - TRUE_GAIN).abs() < 1e-6);
    }

    #[test]
    fn all_failing_samples_is_an_error() {
        let err = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_only,
                identity,
                &[sample(-1.0), sample(-2.0)],
                &vec![vec![1.0]],
                &vec![vec![(0.0, 10.0)]],
            )
            .unwrap_err();
        assert!(matches!(err, CalibrationError::NoUsableSamples(2)));
    }

    #[test]
    fn shape_is_checked_before_any_estimate() {
        let err = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_and_offset,
                identity,
                &[sample(1.0)],
                &vec![vec![1.0], vec![0.0]],
                &vec![vec![(0.0, 10.0)]],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::RowCountMismatch {
                values: 2,
                bounds: 1
            }
        ));

        let err = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_only,
                identity,
                &[],
                &vec![vec![1.0]],
                &vec![vec![(0.0, 10.0)]],
            )
            .unwrap_err();
        assert!(matches!(err, CalibrationError::NoSamples));
    }

    #[test]
    fn two_parameters_recovered_from_two_samples() {
        let outcome = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_and_offset,
                identity,
                &[sample(1.0), sample(4.0)],
                &vec![vec![1.0], vec![0.0]],
                &vec![vec![(0.0, 5.0)], vec![(-1.0, 1.0)]],
            )
            .unwrap();
        assert!((outcome.values[0][0] - TRUE_GAIN).abs() < 1e-6);
        assert!((outcome.values[1][0] - TRUE_OFFSET).abs() < 1e-6);
    }

    #[test]
    fn exhausted_budget_is_not_reported_as_converged() {
        let options = CalibrationOptions {
            solve: SolveOptions {
                max_iters: 1,
                ..CalibrationOptions::default().solve
            },
            ..CalibrationOptions::default()
        };
        let outcome = GenericCalibration::new(options)
            .calibrate(
                &LineEstimator,
                &base(),
                gain_and_offset,
                identity,
                &[sample(1.0), sample(4.0)],
                &vec![vec![0.2], vec![-0.9]],
                &vec![vec![(0.0, 5.0)], vec![(-1.0, 1.0)]],
            )
            .unwrap();
        assert!(!outcome.converged());
        assert_eq!(outcome.status, CalibrationStatus::IterationLimit);
        assert!(outcome.report.final_mse <= outcome.report.initial_mse);
    }

    #[test]
    fn fixed_variables_skip_the_solver() {
        let outcome = GenericCalibration::default()
            .calibrate(
                &LineEstimator,
                &base(),
                gain_only,
                identity,
                &[sample(2.0)],
                &vec![vec![2.0]],
                &vec![vec![(2.0, 2.0)]],
            )
            .unwrap();
        assert_eq!(outcome.values, vec![vec![2.0]]);
        assert_eq!(outcome.report.evaluations, 0);
    }
}
