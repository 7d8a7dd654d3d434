use gaze_core::Real;
use serde::{Deserialize, Serialize};

/// Robust kernel applied to per-sample calibration errors.
///
/// Residual rows of a sample are scaled by `sqrt(w)` where `w` is the IRLS
/// weight of that sample's Euclidean error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum RobustKernel {
    /// Plain squared error.
    #[default]
    None,
    /// Quadratic up to `delta`, linear beyond.
    Huber { delta: Real },
    /// `c^2 log(1 + e^2 / c^2)`.
    Cauchy { c: Real },
}

impl RobustKernel {
    /// IRLS weight for an error of magnitude `err`.
    pub fn weight(self, err: Real) -> Real {
        let err = err.abs();
        match self {
            RobustKernel::None => 1.0,
            RobustKernel::Huber { delta } => {
                if err <= delta {
                    1.0
                } else {
                    delta / err
                }
            }
            RobustKernel::Cauchy { c } => 1.0 / (1.0 + (err * err) / (c * c)),
        }
    }

    /// Row scale `sqrt(w)` applied to a sample's residuals.
    pub fn row_scale(self, err: Real) -> Real {
        self.weight(err).sqrt()
    }
}
