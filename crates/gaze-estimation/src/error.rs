use gaze_core::Real;
use thiserror::Error;

/// Per-frame estimation failures.
///
/// Shape variants are raised before any geometric work; the remaining
/// variants report degenerate geometry for a single frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GazeError {
    /// Parameter bundle has the wrong number of cameras for the estimator.
    #[error("estimator needs {expected} camera(s), parameters have {got}")]
    ParameterCameraCount { expected: usize, got: usize },
    /// Observation has the wrong number of cameras for the estimator.
    #[error("estimator needs {expected} camera observation(s), got {got}")]
    ObservationCameraCount { expected: usize, got: usize },
    /// A camera reports a glint count different from the light count.
    #[error("camera {camera}: expected {expected} glints (one per light), got {got}")]
    GlintCountMismatch {
        camera: usize,
        expected: usize,
        got: usize,
    },
    /// Pupil sphere must sit strictly inside the corneal sphere.
    #[error("eye needs 0 < k < r, got r = {r}, k = {k}")]
    InvalidEyeGeometry { r: Real, k: Real },
    #[error("need at least {required} lights, got {got}")]
    NotEnoughLights { required: usize, got: usize },
    /// Rays meet at too small an angle to triangulate.
    #[error("near-parallel rays (sin of widest angle {sin_angle:.3e})")]
    NearParallelRays { sin_angle: Real },
    #[error("ray misses the {surface} sphere")]
    NoSphereIntersection { surface: &'static str },
    #[error("total internal reflection at the corneal surface")]
    TotalInternalReflection,
    /// Iterative cornea solve ran out of iterations.
    #[error("cornea solve did not converge after {iterations} evaluations")]
    NonConvergent { iterations: usize },
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
    #[error("visual axis is parallel to the target plane")]
    ParallelToTargetPlane,
}
