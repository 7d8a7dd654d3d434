use serde::{Deserialize, Serialize};

use crate::{Pt3, Vec3};

/// Output of one gaze estimation call, in the estimator's world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeEstimationResult {
    pub cornea_center: Pt3,
    /// Unit line-of-sight direction.
    pub visual_axis: Vec3,
    /// Unit direction from the cornea center through the pupil center.
    pub optical_axis: Vec3,
    /// Refraction-corrected pupil center.
    pub pupil_center: Pt3,
    /// Eye rotation center, behind the cornea center on the optical axis.
    pub rotation_center: Pt3,
}
