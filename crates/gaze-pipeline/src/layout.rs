//! Calibration variable layouts.
//!
//! A [`CalibrationLayout`] is the single source of the initial values, the
//! bounds and the applicator, so their row order cannot drift apart.

use anyhow::{ensure, Result};
use gaze_core::{deg_to_rad, EyeAndCameraParameters, Real};
use gaze_optim::{BoundsArray, VariableVector};
use serde::{Deserialize, Serialize};

/// Parameter field a calibration variable writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum CalibratedField {
    Alpha,
    Beta,
    CornealRadius,
    PupilDistance,
    CameraAngleX { camera: usize },
    CameraAngleY { camera: usize },
    CameraAngleZ { camera: usize },
}

impl CalibratedField {
    pub fn camera(&self) -> Option<usize> {
        match *self {
            Self::CameraAngleX { camera }
            | Self::CameraAngleY { camera }
            | Self::CameraAngleZ { camera } => Some(camera),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match *self {
            Self::Alpha => "alpha".to_string(),
            Self::Beta => "beta".to_string(),
            Self::CornealRadius => "r".to_string(),
            Self::PupilDistance => "k".to_string(),
            Self::CameraAngleX { camera } => format!("camera[{camera}].angle_x"),
            Self::CameraAngleY { camera } => format!("camera[{camera}].angle_y"),
            Self::CameraAngleZ { camera } => format!("camera[{camera}].angle_z"),
        }
    }

    /// Current value in `params`; `None` for a camera index out of range.
    pub fn read(&self, params: &EyeAndCameraParameters) -> Option<Real> {
        let eye = &params.eye;
        match *self {
            Self::Alpha => Some(eye.alpha),
            Self::Beta => Some(eye.beta),
            Self::CornealRadius => Some(eye.r),
            Self::PupilDistance => Some(eye.k),
            Self::CameraAngleX { camera } => params.cameras.get(camera).map(|c| c.angle_x()),
            Self::CameraAngleY { camera } => params.cameras.get(camera).map(|c| c.angle_y()),
            Self::CameraAngleZ { camera } => params.cameras.get(camera).map(|c| c.angle_z()),
        }
    }

    pub fn write(&self, params: &mut EyeAndCameraParameters, value: Real) {
        let eye = &mut params.eye;
        match *self {
            Self::Alpha => eye.alpha = value,
            Self::Beta => eye.beta = value,
            Self::CornealRadius => eye.r = value,
            Self::PupilDistance => eye.k = value,
            Self::CameraAngleX { camera } => {
                if let Some(c) = params.cameras.get_mut(camera) {
                    c.set_angle_x(value);
                }
            }
            Self::CameraAngleY { camera } => {
                if let Some(c) = params.cameras.get_mut(camera) {
                    c.set_angle_y(value);
                }
            }
            Self::CameraAngleZ { camera } => {
                if let Some(c) = params.cameras.get_mut(camera) {
                    c.set_angle_z(value);
                }
            }
        }
    }
}

/// One calibrated scalar with its inclusive bounds (radians for angles, cm
/// for lengths).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationVariable {
    #[serde(flatten)]
    pub field: CalibratedField,
    pub lower: Real,
    pub upper: Real,
}

impl CalibrationVariable {
    pub fn new(field: CalibratedField, lower: Real, upper: Real) -> Self {
        Self {
            field,
            lower,
            upper,
        }
    }

    /// Angle variable with bounds given in degrees.
    pub fn degrees(field: CalibratedField, lower_deg: Real, upper_deg: Real) -> Self {
        Self::new(field, deg_to_rad(lower_deg), deg_to_rad(upper_deg))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationLayout {
    #[serde(default)]
    pub variables: Vec<CalibrationVariable>,
}

impl CalibrationLayout {
    pub fn new(variables: Vec<CalibrationVariable>) -> Self {
        Self { variables }
    }

    /// Kappa angles, corneal radius, pupil distance and the y/z angles of
    /// `camera`.
    ///
    /// The camera angles may move 8 and 5 degrees away from their mounted
    /// values `angle_y` and `angle_z` (radians).
    pub fn six_variable(camera: usize, angle_y: Real, angle_z: Real) -> Self {
        let around = |field, center: Real, half_deg: Real| {
            CalibrationVariable::new(
                field,
                center - deg_to_rad(half_deg),
                center + deg_to_rad(half_deg),
            )
        };
        Self::new(vec![
            CalibrationVariable::degrees(CalibratedField::Alpha, -10.0, 10.0),
            CalibrationVariable::degrees(CalibratedField::Beta, -5.0, 5.0),
            CalibrationVariable::new(CalibratedField::CornealRadius, 0.3, 2.0),
            CalibrationVariable::new(CalibratedField::PupilDistance, 0.2, 1.5),
            around(CalibratedField::CameraAngleY { camera }, angle_y, 8.0),
            around(CalibratedField::CameraAngleZ { camera }, angle_z, 5.0),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.field.name()).collect()
    }

    /// Check bounds and camera indices against `params`, and that every
    /// starting value already lies within its bounds.
    pub fn validate(&self, params: &EyeAndCameraParameters) -> Result<()> {
        let num_cameras = params.num_cameras();
        for (idx, var) in self.variables.iter().enumerate() {
            ensure!(
                var.lower.is_finite() && var.upper.is_finite() && var.lower <= var.upper,
                "variable {} ({}): invalid bounds [{}, {}]",
                idx,
                var.field.name(),
                var.lower,
                var.upper
            );
            if let Some(camera) = var.field.camera() {
                ensure!(
                    camera < num_cameras,
                    "variable {} ({}): camera index out of range ({} cameras)",
                    idx,
                    var.field.name(),
                    num_cameras
                );
            }
            if let Some(x) = var.field.read(params) {
                ensure!(
                    var.lower <= x && x <= var.upper,
                    "variable {} ({}): initial value {} outside [{}, {}]",
                    idx,
                    var.field.name(),
                    x,
                    var.lower,
                    var.upper
                );
            }
        }
        Ok(())
    }

    /// One row per variable, read from `params`.
    pub fn initial_values(&self, params: &EyeAndCameraParameters) -> Result<VariableVector> {
        self.variables
            .iter()
            .map(|v| {
                v.field
                    .read(params)
                    .map(|x| vec![x])
                    .ok_or_else(|| anyhow::anyhow!("{} refers to a missing camera", v.field.name()))
            })
            .collect()
    }

    pub fn bounds(&self) -> BoundsArray {
        self.variables
            .iter()
            .map(|v| vec![(v.lower, v.upper)])
            .collect()
    }

    /// Write `values` (one row per variable) into `params`.
    ///
    /// Extra rows are ignored; the calibration engine checks the shape before
    /// any candidate reaches this point.
    pub fn apply(
        &self,
        mut params: EyeAndCameraParameters,
        values: &VariableVector,
    ) -> EyeAndCameraParameters {
        for (var, row) in self.variables.iter().zip(values) {
            if let Some(&value) = row.first() {
                var.field.write(&mut params, value);
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_core::{EyeParameters, PinholeCamera, Pt3, Vec2, Vec3};

    fn params() -> EyeAndCameraParameters {
        EyeAndCameraParameters {
            eye: EyeParameters::default(),
            cameras: vec![PinholeCamera::new(
                Vec2::new(299.5, 399.5),
                Vec2::new(2.4e-6, 2.4e-6),
                0.0119144,
                Pt3::origin(),
                Vec3::new(0.1, 0.02, -0.03),
            )],
            lights: vec![Pt3::new(13.0, 0.0, 0.0), Pt3::new(-13.0, 0.0, 0.0)],
            distance_to_camera_estimate: 10.0,
        }
    }

    #[test]
    fn initial_values_bounds_and_applicator_stay_in_lockstep() {
        let base = params();
        let layout = CalibrationLayout::six_variable(0, 0.02, -0.03);
        let initial = layout.initial_values(&base).unwrap();
        let bounds = layout.bounds();
        assert_eq!(initial.len(), 6);
        assert_eq!(bounds.len(), 6);
        assert_eq!(initial[4], vec![0.02]);
        assert_eq!(initial[5], vec![-0.03]);

        let values: VariableVector = vec![
            vec![0.01],
            vec![0.02],
            vec![0.9],
            vec![0.5],
            vec![0.04],
            vec![-0.05],
        ];
        let applied = layout.apply(base.clone(), &values);
        assert_eq!(applied.eye.alpha, 0.01);
        assert_eq!(applied.eye.beta, 0.02);
        assert_eq!(applied.eye.r, 0.9);
        assert_eq!(applied.eye.k, 0.5);
        assert_eq!(applied.cameras[0].angle_x(), 0.1);
        assert_eq!(applied.cameras[0].angle_y(), 0.04);
        assert_eq!(applied.cameras[0].angle_z(), -0.05);
        assert_eq!(layout.initial_values(&applied).unwrap(), values);
        // The base bundle is untouched.
        assert_eq!(base.eye.r, 0.78);
    }

    #[test]
    fn out_of_range_camera_is_rejected() {
        let layout = CalibrationLayout::six_variable(1, 0.0, 0.0);
        let mut base = params();
        assert!(layout.validate(&base).is_err());
        assert!(layout.initial_values(&base).is_err());
        base.cameras.push(base.cameras[0].clone());
        base.cameras[1].set_angle_y(0.0);
        base.cameras[1].set_angle_z(0.0);
        assert!(layout.validate(&base).is_ok());
    }

    #[test]
    fn camera_bounds_follow_the_mounted_angle() {
        let layout = CalibrationLayout::six_variable(0, -0.1574, 0.0);
        let var = layout.variables[4];
        assert!((var.lower - (-0.1574 - deg_to_rad(8.0))).abs() < 1e-12);
        assert!((var.upper - (-0.1574 + deg_to_rad(8.0))).abs() < 1e-12);
    }

    #[test]
    fn initial_value_outside_bounds_is_rejected() {
        let mut base = params();
        base.cameras[0].set_angle_y(deg_to_rad(-9.0));
        let layout = CalibrationLayout::new(vec![CalibrationVariable::degrees(
            CalibratedField::CameraAngleY { camera: 0 },
            -8.0,
            8.0,
        )]);
        let err = layout.validate(&base).unwrap_err();
        assert!(err.to_string().contains("outside"), "{err}");
    }

    #[test]
    fn layout_json_is_readable() {
        let layout = CalibrationLayout::new(vec![CalibrationVariable::new(
            CalibratedField::CameraAngleY { camera: 1 },
            -0.1,
            0.1,
        )]);
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(
            json,
            r#"{"variables":[{"field":"camera_angle_y","camera":1,"lower":-0.1,"upper":0.1}]}"#
        );
        let back: CalibrationLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
