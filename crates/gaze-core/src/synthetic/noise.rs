//! Deterministic pixel noise for synthetic observations.
//!
//! Samples come from a splitmix64 stream keyed by `(frame, feature)`, so a
//! dataset is identical across platforms and `rand` versions.

use crate::{PupilCenterGlintInputs, Pt2, Real, Vec2};

/// Uniform per-axis pixel noise in `[-max_abs_px, +max_abs_px]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformPixelNoise {
    pub seed: u64,
    pub max_abs_px: Real,
}

impl UniformPixelNoise {
    pub fn new(seed: u64, max_abs_px: Real) -> Self {
        Self { seed, max_abs_px }
    }

    /// Noise vector for feature `feature_idx` of frame `frame_idx`.
    pub fn sample(&self, frame_idx: usize, feature_idx: usize) -> Vec2 {
        let max_abs = self.max_abs_px.abs();
        if max_abs == 0.0 {
            return Vec2::zeros();
        }

        let key = mix_key(self.seed, frame_idx, feature_idx);
        let u = u64_to_unit(splitmix64(key));
        let v = u64_to_unit(splitmix64(key ^ 0x94D0_49BB_1331_11EB));
        Vec2::new((u - 0.5) * 2.0 * max_abs, (v - 0.5) * 2.0 * max_abs)
    }

    pub fn apply(&self, frame_idx: usize, feature_idx: usize, px: Pt2) -> Pt2 {
        px + self.sample(frame_idx, feature_idx)
    }

    /// Perturb every pupil and glint pixel of a frame.
    ///
    /// Features are numbered camera by camera: pupil first, then glints.
    pub fn apply_to_observation(
        &self,
        frame_idx: usize,
        observation: &PupilCenterGlintInputs,
    ) -> PupilCenterGlintInputs {
        let mut out = observation.clone();
        let mut feature = 0;
        for cam in &mut out.cameras {
            cam.pupil = self.apply(frame_idx, feature, cam.pupil);
            feature += 1;
            for glint in &mut cam.glints {
                *glint = self.apply(frame_idx, feature, *glint);
                feature += 1;
            }
        }
        out
    }
}

fn mix_key(seed: u64, frame_idx: usize, feature_idx: usize) -> u64 {
    seed ^ (frame_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (feature_idx as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// Top 53 bits to [0, 1).
fn u64_to_unit(x: u64) -> Real {
    ((x >> 11) as Real) * (1.0 / ((1u64 << 53) as Real))
}
