use gaze_core::{EyeAndCameraParameters, GazeEstimationResult, PupilCenterGlintInputs};
use gaze_optim::Estimator;
use serde::{Deserialize, Serialize};

use crate::{GazeError, OneCameraSpherical, TwoCameraMode, TwoCameraSpherical};

/// Closed set of estimation strategies, picked once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GazeEstimatorKind {
    SingleCamera(OneCameraSpherical),
    TwoCamera(TwoCameraSpherical),
}

impl GazeEstimatorKind {
    pub fn single_camera() -> Self {
        Self::SingleCamera(OneCameraSpherical::default())
    }

    pub fn two_camera(mode: TwoCameraMode) -> Self {
        Self::TwoCamera(TwoCameraSpherical::with_mode(mode))
    }

    /// Cameras the strategy expects in both parameters and observations.
    pub fn num_cameras(&self) -> usize {
        match self {
            Self::SingleCamera(_) => 1,
            Self::TwoCamera(_) => 2,
        }
    }

    pub fn estimate(
        &self,
        inputs: &PupilCenterGlintInputs,
        params: &EyeAndCameraParameters,
    ) -> Result<GazeEstimationResult, GazeError> {
        match self {
            Self::SingleCamera(e) => e.estimate(inputs, params),
            Self::TwoCamera(e) => e.estimate(inputs, params),
        }
    }
}

impl Default for GazeEstimatorKind {
    fn default() -> Self {
        Self::single_camera()
    }
}

macro_rules! impl_estimator {
    ($($ty:ty),*) => {$(
        impl Estimator<EyeAndCameraParameters, PupilCenterGlintInputs> for $ty {
            type Output = GazeEstimationResult;
            type Error = GazeError;

            fn estimate(
                &self,
                observation: &PupilCenterGlintInputs,
                params: &EyeAndCameraParameters,
            ) -> Result<GazeEstimationResult, GazeError> {
                <$ty>::estimate(self, observation, params)
            }
        }
    )*};
}

impl_estimator!(GazeEstimatorKind, OneCameraSpherical, TwoCameraSpherical);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_json() {
        for kind in [
            GazeEstimatorKind::single_camera(),
            GazeEstimatorKind::two_camera(TwoCameraMode::PlaneIntersection),
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: GazeEstimatorKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
        assert_eq!(GazeEstimatorKind::default().num_cameras(), 1);
    }
}
