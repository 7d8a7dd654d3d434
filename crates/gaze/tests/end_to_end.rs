use gaze::core::synthetic::eye::{observe, EyePose};
use gaze::prelude::*;

#[test]
fn prelude_covers_a_full_calibration_session() {
    let truth = ScenarioConfig::single_camera_reference();
    let synth = SyntheticSession {
        eye_positions: vec![[24.0, -12.0, 60.0], [22.0, -11.0, 57.0]],
        ..SyntheticSession::default()
    };
    let samples = synth.generate(&truth).unwrap();

    let mut config = truth.clone();
    config.eye.alpha += 0.03;
    let before = evaluate(&config, &config.parameters(), &samples.test).unwrap();
    let report = run_session(&config, &samples, true).unwrap();

    let run = report.calibration.expect("calibration ran");
    assert_eq!(run.variables.len(), 6);
    assert!(run.outcome.report.final_mse < run.outcome.report.initial_mse);
    assert!(report.evaluation.failed.is_empty());
    let before_px = before.mean_error_px.unwrap();
    let after_px = report.evaluation.mean_error_px.unwrap();
    assert!(
        after_px < 0.5 * before_px,
        "calibration did not help: {before_px:.2} -> {after_px:.2} px"
    );
}

#[test]
fn engine_drives_the_estimator_directly() {
    let config = ScenarioConfig::two_camera_reference();
    let truth = config.parameters();
    let reducer = config.reducer();
    let eye = Pt3::new(0.0, 3.0, 60.0);

    let samples: Vec<CalibrationSample<PupilCenterGlintInputs>> = [
        (-15.0, 8.0),
        (15.0, 8.0),
        (0.0, 0.0),
        (-15.0, -8.0),
        (15.0, -8.0),
    ]
    .iter()
    .map(|&(x, y)| {
        let target = Pt3::new(x, y, 0.0);
        let pose = EyePose::looking_at(&truth.eye, eye, &target);
        CalibrationSample::new(observe(&truth, &pose).unwrap(), target)
    })
    .collect();

    let mut base = truth.clone();
    base.eye.beta = 0.0;
    let initial: VariableVector = vec![vec![base.eye.beta]];
    let bounds: BoundsArray = vec![vec![(-0.1, 0.1)]];

    let outcome = GenericCalibration::default()
        .calibrate(
            &config.estimator,
            &base,
            |mut p: EyeAndCameraParameters, v: &VariableVector| {
                p.eye.beta = v[0][0];
                p
            },
            |r: &GazeEstimationResult| reducer.reduce(r),
            &samples,
            &initial,
            &bounds,
        )
        .unwrap();

    let err = (outcome.values[0][0] - truth.eye.beta).abs();
    assert!(err < 1e-6, "beta off by {err}");
    assert!(outcome.report.final_rms < 1e-4);
}
