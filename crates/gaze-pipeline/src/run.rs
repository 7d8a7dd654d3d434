//! Calibration and evaluation runs over labeled samples.

use std::time::Instant;

use anyhow::{ensure, Context, Result};
use gaze_core::{
    EyeAndCameraParameters, EyeParameters, GazeEstimationResult, PinholeCameraParams, Pt2,
    PupilCenterGlintInputs, Real,
};
use gaze_optim::{CalibrationOutcome, CalibrationSample, GenericCalibration, VariableVector};
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::session::{LabeledSample, SessionInput};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedVariable {
    pub name: String,
    pub initial: Real,
    pub value: Real,
    pub lower: Real,
    pub upper: Real,
}

/// Result of [`run_calibration`].
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationRun {
    /// Calibrated bundle in the estimator frame.
    #[serde(skip)]
    pub parameters: EyeAndCameraParameters,
    pub eye: EyeParameters,
    /// Calibrated cameras with world-frame positions.
    pub cameras: Vec<PinholeCameraParams>,
    pub variables: Vec<FittedVariable>,
    pub outcome: CalibrationOutcome,
}

fn world_cameras(
    config: &ScenarioConfig,
    params: &EyeAndCameraParameters,
) -> Vec<PinholeCameraParams> {
    let offset = config.wcs_offset();
    params
        .cameras
        .iter()
        .map(|camera| {
            let mut p = PinholeCameraParams::from(camera);
            p.position = (camera.position - offset).coords.into();
            p
        })
        .collect()
}

/// Fit the scenario's calibration layout to `samples`.
pub fn run_calibration(
    config: &ScenarioConfig,
    samples: &[LabeledSample],
) -> Result<CalibrationRun> {
    config.validate()?;
    let layout = &config.calibration.layout;
    ensure!(
        !layout.is_empty(),
        "scenario '{}' has no calibration variables",
        config.name
    );
    ensure!(!samples.is_empty(), "no calibration samples");

    let base = config.parameters();
    let initial = layout.initial_values(&base)?;
    let bounds = layout.bounds();
    let targets: Vec<CalibrationSample<PupilCenterGlintInputs>> = samples
        .iter()
        .map(|s| CalibrationSample::new(s.observation.clone(), config.target_world(s.truth)))
        .collect();
    let reducer = config.reducer();

    let engine = GenericCalibration::new(config.calibration.options);
    let outcome = engine
        .calibrate(
            &config.estimator,
            &base,
            |params, values: &VariableVector| layout.apply(params, values),
            |result: &GazeEstimationResult| reducer.reduce(result),
            &targets,
            &initial,
            &bounds,
        )
        .with_context(|| format!("calibration of scenario '{}' failed", config.name))?;

    if !outcome.converged() {
        warn!(
            "calibration of '{}' ended with {:?}; keeping the best values found",
            config.name, outcome.status
        );
    }

    let variables: Vec<FittedVariable> = layout
        .variables
        .iter()
        .zip(initial.iter().zip(&outcome.values))
        .map(|(var, (x0, x))| FittedVariable {
            name: var.field.name(),
            initial: x0[0],
            value: x[0],
            lower: var.lower,
            upper: var.upper,
        })
        .collect();
    for v in &variables {
        info!("  {:<18} {:+.6} (from {:+.6})", v.name, v.value, v.initial);
    }

    let parameters = layout.apply(base, &outcome.values);
    Ok(CalibrationRun {
        eye: parameters.eye,
        cameras: world_cameras(config, &parameters),
        parameters,
        variables,
        outcome,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleError {
    pub index: usize,
    /// World-frame point of interest (cm).
    pub poi: [Real; 3],
    pub error_cm: Real,
    pub error_px: Real,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSample {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub samples: Vec<SampleError>,
    pub failed: Vec<FailedSample>,
    /// Averages over the successful samples; `None` when every sample failed.
    pub mean_error_px: Option<Real>,
    pub mean_error_cm: Option<Real>,
    /// Wall time spent in estimation and reduction (seconds).
    pub total_time_s: Real,
    pub time_per_estimate_s: Option<Real>,
    /// Upper bound on the frame rate the estimator alone could sustain.
    pub fps: Option<Real>,
}

impl EvaluationReport {
    pub fn num_evaluated(&self) -> usize {
        self.samples.len() + self.failed.len()
    }
}

fn mean(values: impl ExactSizeIterator<Item = Real>) -> Option<Real> {
    let n = values.len();
    (n > 0).then(|| values.sum::<Real>() / n as Real)
}

/// Estimate every sample with `params` and compare against its ground truth.
pub fn evaluate(
    config: &ScenarioConfig,
    params: &EyeAndCameraParameters,
    samples: &[LabeledSample],
) -> Result<EvaluationReport> {
    ensure!(
        params.num_cameras() == config.estimator.num_cameras(),
        "parameters have {} camera(s), estimator expects {}",
        params.num_cameras(),
        config.estimator.num_cameras()
    );
    let reducer = config.reducer();

    let mut poi = Vec::with_capacity(samples.len());
    let start = Instant::now();
    for sample in samples {
        poi.push(
            config
                .estimator
                .estimate(&sample.observation, params)
                .and_then(|result| reducer.reduce(&result)),
        );
    }
    let total_time_s = start.elapsed().as_secs_f64();

    let mut errors = Vec::new();
    let mut failed = Vec::new();
    for (index, (sample, p)) in samples.iter().zip(poi).enumerate() {
        match p {
            Ok(p) => {
                let target = config.target_world(sample.truth);
                let p_px: Pt2 = config.screen.world_to_pixel(&p);
                let t_px: Pt2 = config.screen.world_to_pixel(&target);
                errors.push(SampleError {
                    index,
                    poi: p.coords.into(),
                    error_cm: (p - target).xy().norm(),
                    error_px: (p_px - t_px).norm(),
                });
            }
            Err(err) => {
                debug!("sample {index} failed: {err}");
                failed.push(FailedSample {
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }
    if !failed.is_empty() {
        warn!("{} of {} samples failed to estimate", failed.len(), samples.len());
    }

    let time_per_estimate_s = (!samples.is_empty()).then(|| total_time_s / samples.len() as Real);
    let fps = time_per_estimate_s.filter(|t| *t > 0.0).map(|t| 1.0 / t);
    let report = EvaluationReport {
        mean_error_px: mean(errors.iter().map(|e| e.error_px)),
        mean_error_cm: mean(errors.iter().map(|e| e.error_cm)),
        samples: errors,
        failed,
        total_time_s,
        time_per_estimate_s,
        fps,
    };
    if let (Some(px), Some(cm)) = (report.mean_error_px, report.mean_error_cm) {
        info!(
            "'{}': mean error {:.2} px ({:.3} cm) over {} samples",
            config.name,
            px,
            cm,
            report.samples.len()
        );
    }
    Ok(report)
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub scenario: String,
    pub calibration: Option<CalibrationRun>,
    pub evaluation: EvaluationReport,
}

/// Calibrate on the session's calibration samples (when `calibrate` is set
/// and there is something to fit) and evaluate on its test samples.
pub fn run_session(
    config: &ScenarioConfig,
    input: &SessionInput,
    calibrate: bool,
) -> Result<SessionReport> {
    config.validate()?;
    ensure!(
        !input.calibration.is_empty() || !input.test.is_empty(),
        "session has no samples"
    );

    let calibration = if !calibrate {
        None
    } else if input.calibration.is_empty() || config.calibration.layout.is_empty() {
        info!("nothing to calibrate for '{}', using configured parameters", config.name);
        None
    } else {
        Some(run_calibration(config, &input.calibration)?)
    };

    let params = match &calibration {
        Some(run) => run.parameters.clone(),
        None => config.parameters(),
    };
    let test = if input.test.is_empty() {
        warn!("no test samples, evaluating on the calibration samples");
        &input.calibration
    } else {
        &input.test
    };
    let evaluation = evaluate(config, &params, test)?;

    Ok(SessionReport {
        scenario: config.name.clone(),
        calibration,
        evaluation,
    })
}
