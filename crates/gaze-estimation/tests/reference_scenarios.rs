use gaze_core::synthetic::eye::{observe, EyePose};
use gaze_core::synthetic::noise::UniformPixelNoise;
use gaze_core::{
    deg_to_rad, EyeAndCameraParameters, EyeParameters, PinholeCamera, Pt2, Pt3, Real, Vec2, Vec3,
};
use gaze_estimation::{
    GazeEstimatorKind, PointOfInterestReducer, ScreenGeometry, TargetPlane, TwoCameraMode,
};

const CAMERA_WORLD: [Real; 3] = [24.5, -35.0, 10.0];

fn wcs_offset() -> Vec3 {
    -Vec3::from(CAMERA_WORLD)
}

fn single_camera_scene() -> EyeAndCameraParameters {
    let offset = wcs_offset();
    let camera_world = Pt3::from(CAMERA_WORLD);
    let camera = PinholeCamera::new(
        Vec2::new(299.5, 399.5),
        Vec2::new(2.4e-6, 2.4e-6),
        0.0119144,
        camera_world + offset,
        Vec3::new(deg_to_rad(8.0), 0.0, 0.0),
    );
    EyeAndCameraParameters {
        eye: EyeParameters::default(),
        cameras: vec![camera],
        lights: vec![
            camera_world + Vec3::new(13.0, 0.0, 0.0) + offset,
            camera_world + Vec3::new(-13.0, 0.0, 0.0) + offset,
        ],
        distance_to_camera_estimate: 10.0,
    }
}

fn screen() -> ScreenGeometry {
    ScreenGeometry::new([48.7, 27.4], [1680.0, 1050.0])
}

fn screen_targets() -> Vec<Pt2> {
    let mut targets = Vec::new();
    for &x in &[160.0, 840.0, 1520.0] {
        for &y in &[100.0, 525.0, 950.0] {
            targets.push(Pt2::new(x, y));
        }
    }
    targets
}

#[test]
fn single_camera_reference_scene_round_trips_to_screen_pixels() {
    let params = single_camera_scene();
    let estimator = GazeEstimatorKind::single_camera();
    let reducer = PointOfInterestReducer::new(TargetPlane::z(-CAMERA_WORLD[2]), wcs_offset());
    let screen = screen();
    let eye_world = Pt3::new(24.0, -12.0, 60.0);

    for target_px in screen_targets() {
        let target_world = screen.pixel_to_world(&target_px);
        let pose = EyePose::looking_at(
            &params.eye,
            eye_world + wcs_offset(),
            &(target_world + wcs_offset()),
        );
        let obs = observe(&params, &pose).expect("synthetic observation");

        let result = estimator.estimate(&obs, &params).expect("estimate");
        let poi_px = screen.world_to_pixel(&reducer.reduce(&result).expect("poi"));
        let err = (poi_px - target_px).norm();
        assert!(err < 2.0, "target {target_px:?}: error {err:.3} px");
    }
}

#[test]
fn single_camera_tolerates_subpixel_noise() {
    let params = single_camera_scene();
    let estimator = GazeEstimatorKind::single_camera();
    let reducer = PointOfInterestReducer::new(TargetPlane::z(-CAMERA_WORLD[2]), wcs_offset());
    let noise = UniformPixelNoise::new(7, 0.05);
    let screen = screen();
    let eye_world = Pt3::new(25.0, -14.0, 58.0);

    let mut total = 0.0;
    let targets = screen_targets();
    for (frame, target_px) in targets.iter().enumerate() {
        let target = screen.pixel_to_world(target_px) + wcs_offset();
        let pose = EyePose::looking_at(&params.eye, eye_world + wcs_offset(), &target);
        let obs = noise.apply_to_observation(frame, &observe(&params, &pose).unwrap());
        let result = estimator.estimate(&obs, &params).expect("noisy estimate");
        let poi_px = screen.world_to_pixel(&reducer.reduce(&result).unwrap());
        total += (poi_px - target_px).norm();
    }
    let mean = total / targets.len() as Real;
    assert!(mean.is_finite() && mean < 150.0, "mean error {mean:.2} px");
}

fn two_camera_scene() -> EyeAndCameraParameters {
    let camera = |x: Real, angle_y: Real| {
        PinholeCamera::new(
            Vec2::new(695.5, 449.5),
            Vec2::new(4.65e-6, 4.65e-6),
            0.0350170102672,
            Pt3::new(x, -21.0, 2.0),
            Vec3::new(deg_to_rad(-27.70716514), deg_to_rad(angle_y), 0.0),
        )
    };
    EyeAndCameraParameters {
        eye: EyeParameters::default(),
        cameras: vec![camera(-10.0, 9.01932243), camera(10.0, -9.01932243)],
        lights: vec![Pt3::new(-25.0, 10.0, 0.0), Pt3::new(25.0, 10.0, 0.0)],
        distance_to_camera_estimate: 100.0,
    }
}

#[test]
fn two_camera_reference_scene_round_trips_in_centimeters() {
    let params = two_camera_scene();
    let reducer = PointOfInterestReducer::new(TargetPlane::z(0.0), Vec3::zeros());
    let eye = Pt3::new(0.5, 2.0, 62.0);

    for mode in [TwoCameraMode::PlaneIntersection, TwoCameraMode::ExplicitRefraction] {
        let estimator = GazeEstimatorKind::two_camera(mode);
        for &(x, y) in &[(-15.0, 8.0), (0.0, 0.0), (18.0, -6.0)] {
            let target = Pt3::new(x, y, 0.0);
            let pose = EyePose::looking_at(&params.eye, eye, &target);
            let obs = observe(&params, &pose).expect("synthetic observation");
            let result = estimator.estimate(&obs, &params).expect("estimate");
            let err = (reducer.reduce(&result).unwrap() - target).norm();
            assert!(err < 1e-3, "{mode:?} target ({x}, {y}): error {err:.2e} cm");
        }
    }
}

#[test]
fn wrong_strategy_for_the_rig_is_a_shape_error() {
    let params = two_camera_scene();
    let pose = EyePose::looking_at(&params.eye, Pt3::new(0.0, 2.0, 60.0), &Pt3::origin());
    let obs = observe(&params, &pose).unwrap();
    let err = GazeEstimatorKind::single_camera()
        .estimate(&obs, &params)
        .unwrap_err();
    assert!(
        matches!(err, gaze_estimation::GazeError::ParameterCameraCount { expected: 1, got: 2 }),
        "{err:?}"
    );
}
