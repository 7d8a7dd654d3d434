use serde::{Deserialize, Serialize};

use crate::Pt2;

/// Pupil center and glint pixels seen by one camera in one frame.
///
/// `glints[i]` is the reflection of light `i` of the parameter bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraObservation {
    pub pupil: Pt2,
    pub glints: Vec<Pt2>,
}

impl CameraObservation {
    pub fn new(pupil: Pt2, glints: Vec<Pt2>) -> Self {
        Self { pupil, glints }
    }
}

/// One frame of pupil/glint features, ordered like the bundle's cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PupilCenterGlintInputs {
    pub cameras: Vec<CameraObservation>,
}

impl PupilCenterGlintInputs {
    pub fn new(cameras: Vec<CameraObservation>) -> Self {
        Self { cameras }
    }

    pub fn single(pupil: Pt2, glints: Vec<Pt2>) -> Self {
        Self {
            cameras: vec![CameraObservation::new(pupil, glints)],
        }
    }

    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }
}
