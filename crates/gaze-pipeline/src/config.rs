//! Scenario configuration.
//!
//! A [`ScenarioConfig`] holds everything that used to be experiment
//! constants: the estimation strategy, the subject's eye, the rig in world
//! coordinates, the screen and the calibration layout. Positions are given in
//! the world frame; [`ScenarioConfig::parameters`] moves them into the
//! estimator frame by adding `wcs_offset`.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use gaze_core::{
    deg_to_rad, EyeAndCameraParameters, EyeParameters, PinholeCameraParams, Pt2, Pt3, Real, Vec3,
};
use gaze_estimation::{
    GazeEstimatorKind, PointOfInterestReducer, ScreenGeometry, TargetPlane, TwoCameraMode,
};
use gaze_optim::CalibrationOptions;
use serde::{Deserialize, Serialize};

use crate::layout::CalibrationLayout;

/// Unit of the ground truth attached to labeled samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTruthUnits {
    /// Screen pixels, origin top-left, `y` down.
    #[default]
    ScreenPixels,
    /// World centimeters on the screen plane, `y` up.
    Centimeters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(flatten)]
    pub layout: CalibrationLayout,
    #[serde(default)]
    pub options: CalibrationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub estimator: GazeEstimatorKind,
    #[serde(default)]
    pub eye: EyeParameters,
    /// Cameras with world-frame positions.
    pub cameras: Vec<PinholeCameraParams>,
    /// Light positions in the world frame (cm).
    pub lights: Vec<[Real; 3]>,
    pub distance_to_camera_estimate: Real,
    /// Shift from the world frame to the estimator frame (cm).
    #[serde(default)]
    pub wcs_offset: [Real; 3],
    /// World `z` of the screen plane (cm).
    #[serde(default)]
    pub screen_plane_z: Real,
    pub screen: ScreenGeometry,
    #[serde(default)]
    pub ground_truth: GroundTruthUnits,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        let expected = self.estimator.num_cameras();
        ensure!(
            self.cameras.len() == expected,
            "scenario '{}': estimator expects {} camera(s), got {}",
            self.name,
            expected,
            self.cameras.len()
        );
        ensure!(
            self.lights.len() >= 2,
            "scenario '{}': need at least 2 lights, got {}",
            self.name,
            self.lights.len()
        );
        ensure!(
            self.distance_to_camera_estimate.is_finite() && self.distance_to_camera_estimate > 0.0,
            "scenario '{}': distance_to_camera_estimate must be positive, got {}",
            self.name,
            self.distance_to_camera_estimate
        );
        let eye = &self.eye;
        ensure!(
            eye.r > 0.0 && eye.k > 0.0 && eye.k < eye.r,
            "scenario '{}': eye needs 0 < k < r (r = {}, k = {})",
            self.name,
            eye.r,
            eye.k
        );
        ensure!(
            eye.n1 > 0.0 && eye.n2 > 0.0,
            "scenario '{}': refractive indices must be positive",
            self.name
        );
        for (idx, cam) in self.cameras.iter().enumerate() {
            ensure!(
                cam.focal_length > 0.0 && cam.pixel_size.iter().all(|s| *s > 0.0),
                "scenario '{}': camera {} needs positive focal length and pixel size",
                self.name,
                idx
            );
        }
        ensure!(
            self.screen.size_cm.iter().all(|s| *s > 0.0)
                && self.screen.resolution.iter().all(|r| *r > 0.0),
            "scenario '{}': screen size and resolution must be positive",
            self.name
        );
        self.calibration
            .layout
            .validate(&self.parameters())
            .with_context(|| format!("scenario '{}': calibration layout", self.name))
    }

    pub fn wcs_offset(&self) -> Vec3 {
        Vec3::from(self.wcs_offset)
    }

    /// Parameter bundle in the estimator frame.
    pub fn parameters(&self) -> EyeAndCameraParameters {
        let offset = self.wcs_offset();
        let cameras = self
            .cameras
            .iter()
            .map(|c| {
                let mut camera = c.build();
                camera.position += offset;
                camera
            })
            .collect();
        EyeAndCameraParameters {
            eye: self.eye,
            cameras,
            lights: self.lights.iter().map(|l| Pt3::from(*l) + offset).collect(),
            distance_to_camera_estimate: self.distance_to_camera_estimate,
        }
    }

    /// Reducer mapping an estimate to its world-frame point on the screen.
    pub fn reducer(&self) -> PointOfInterestReducer {
        let offset = self.wcs_offset();
        PointOfInterestReducer::new(TargetPlane::z(self.screen_plane_z + offset.z), offset)
    }

    /// World-frame target on the screen plane for a ground truth value.
    pub fn target_world(&self, truth: [Real; 2]) -> Pt3 {
        match self.ground_truth {
            GroundTruthUnits::ScreenPixels => {
                let p = self.screen.pixel_to_world(&Pt2::from(truth));
                Pt3::new(p.x, p.y, self.screen_plane_z)
            }
            GroundTruthUnits::Centimeters => Pt3::new(truth[0], truth[1], self.screen_plane_z),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("failed to parse scenario JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// One camera 8 degrees up below a 1680x1050 screen, two lights 13 cm to
    /// either side, calibrating kappa, cornea shape and the camera's y/z
    /// angles.
    pub fn single_camera_reference() -> Self {
        let camera_world = [24.5, -35.0, 10.0];
        let lights = [
            [camera_world[0] + 13.0, camera_world[1], camera_world[2]],
            [camera_world[0] - 13.0, camera_world[1], camera_world[2]],
        ];
        Self {
            name: "single_camera".to_string(),
            estimator: GazeEstimatorKind::single_camera(),
            eye: EyeParameters::default(),
            cameras: vec![PinholeCameraParams {
                principal_point: [299.5, 399.5],
                pixel_size: [2.4e-6, 2.4e-6],
                focal_length: 0.0119144,
                position: camera_world,
                angles: [deg_to_rad(8.0), 0.0, 0.0],
            }],
            lights: lights.to_vec(),
            distance_to_camera_estimate: 10.0,
            wcs_offset: camera_world.map(|v| -v),
            screen_plane_z: 0.0,
            screen: ScreenGeometry::new([48.7, 27.4], [1680.0, 1050.0]),
            ground_truth: GroundTruthUnits::ScreenPixels,
            calibration: CalibrationConfig {
                layout: CalibrationLayout::six_variable(0, 0.0, 0.0),
                options: CalibrationOptions::default(),
            },
        }
    }

    /// Two cameras 20 cm apart looking up and inward, two lights 50 cm apart,
    /// ground truth in centimeters.
    pub fn two_camera_reference() -> Self {
        let camera = |x: Real, angle_y: Real| PinholeCameraParams {
            principal_point: [695.5, 449.5],
            pixel_size: [4.65e-6, 4.65e-6],
            focal_length: 0.0350170102672,
            position: [x, -21.0, 2.0],
            angles: [deg_to_rad(-27.70716514), deg_to_rad(angle_y), 0.0],
        };
        let angle_y = deg_to_rad(-9.01932243);
        Self {
            name: "two_camera".to_string(),
            estimator: GazeEstimatorKind::two_camera(TwoCameraMode::ExplicitRefraction),
            eye: EyeParameters::default(),
            cameras: vec![camera(-10.0, 9.01932243), camera(10.0, -9.01932243)],
            lights: vec![[-25.0, 10.0, 0.0], [25.0, 10.0, 0.0]],
            distance_to_camera_estimate: 100.0,
            wcs_offset: [0.0; 3],
            screen_plane_z: 0.0,
            screen: ScreenGeometry::new([48.7, 27.4], [1680.0, 1050.0]),
            ground_truth: GroundTruthUnits::Centimeters,
            calibration: CalibrationConfig {
                layout: CalibrationLayout::six_variable(1, angle_y, 0.0),
                options: CalibrationOptions::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        ScenarioConfig::single_camera_reference().validate().unwrap();
        ScenarioConfig::two_camera_reference().validate().unwrap();
    }

    #[test]
    fn scenario_json_roundtrip() {
        let config = ScenarioConfig::two_camera_reference();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back = ScenarioConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn single_camera_sits_at_the_estimator_origin() {
        let config = ScenarioConfig::single_camera_reference();
        let params = config.parameters();
        assert!(params.cameras[0].position.coords.norm() < 1e-12);
        assert!((params.lights[0] - Pt3::new(13.0, 0.0, 0.0)).norm() < 1e-12);

        let reducer = config.reducer();
        assert!((reducer.plane.point.z + 10.0).abs() < 1e-12);

        let target = config.target_world([840.0, 525.0]);
        assert!((target - Pt3::new(24.35, -13.7, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn camera_count_must_match_the_strategy() {
        let mut config = ScenarioConfig::single_camera_reference();
        config.estimator = GazeEstimatorKind::two_camera(TwoCameraMode::PlaneIntersection);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("expects 2 camera(s)"), "{err}");
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "name": "minimal",
            "cameras": [{
                "principal_point": [299.5, 399.5],
                "pixel_size": [2.4e-6, 2.4e-6],
                "focal_length": 0.0119144,
                "position": [0.0, 0.0, 0.0],
                "angles": [0.0, 0.0, 0.0]
            }],
            "lights": [[13.0, 0.0, 0.0], [-13.0, 0.0, 0.0]],
            "distance_to_camera_estimate": 10.0,
            "screen": {"size_cm": [48.7, 27.4], "resolution": [1680.0, 1050.0]}
        }"#;
        let config = ScenarioConfig::from_json(json).unwrap();
        assert_eq!(config.estimator, GazeEstimatorKind::single_camera());
        assert_eq!(config.eye, EyeParameters::default());
        assert!(config.calibration.layout.is_empty());
        assert_eq!(config.ground_truth, GroundTruthUnits::ScreenPixels);
    }
}
