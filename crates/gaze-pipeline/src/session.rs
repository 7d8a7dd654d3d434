//! Labeled samples and synthetic sessions.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use gaze_core::synthetic::eye::{observe, EyePose};
use gaze_core::synthetic::noise::UniformPixelNoise;
use gaze_core::{Pt3, PupilCenterGlintInputs, Real};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{GroundTruthUnits, ScenarioConfig};

/// An observation with the point the subject was looking at, in the
/// scenario's ground-truth units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub observation: PupilCenterGlintInputs,
    pub truth: [Real; 2],
}

/// Samples of one subject: a calibration set and a held-out test set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInput {
    #[serde(default)]
    pub calibration: Vec<LabeledSample>,
    #[serde(default)]
    pub test: Vec<LabeledSample>,
}

impl SessionInput {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse session samples")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read samples {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid samples {}", path.display()))
    }
}

/// Recipe for a synthetic session rendered from a scenario's own parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticSession {
    /// World-frame cornea centers, used in turn for consecutive targets.
    pub eye_positions: Vec<[Real; 3]>,
    /// Target grid `[columns, rows]` for the calibration set.
    pub calibration_grid: [usize; 2],
    /// Target grid for the test set. Targets sit at cell centers, so none
    /// of them coincides with a calibration target on the screen border.
    pub test_grid: [usize; 2],
    /// Fraction of the screen left free at each border.
    pub margin: Real,
    /// Uniform image noise bound in pixels.
    pub noise_px: Real,
    pub seed: u64,
}

impl Default for SyntheticSession {
    fn default() -> Self {
        Self {
            eye_positions: vec![[24.0, -12.0, 60.0]],
            calibration_grid: [3, 3],
            test_grid: [4, 3],
            margin: 0.1,
            noise_px: 0.0,
            seed: 0,
        }
    }
}

impl SyntheticSession {
    /// Grid of ground-truth values covering the screen.
    ///
    /// Corner grids put their outer targets on the margin; cell-center grids
    /// split the usable area into `n` equal cells and use their centers.
    /// Screen pixels span the full resolution; centimeter targets are centered
    /// on the world origin.
    fn grid(
        &self,
        config: &ScenarioConfig,
        dims: [usize; 2],
        cell_centers: bool,
    ) -> Vec<[Real; 2]> {
        let extent = match config.ground_truth {
            GroundTruthUnits::ScreenPixels => config.screen.resolution,
            GroundTruthUnits::Centimeters => config.screen.size_cm,
        };
        let origin = match config.ground_truth {
            GroundTruthUnits::ScreenPixels => [0.0, 0.0],
            GroundTruthUnits::Centimeters => [-0.5 * extent[0], -0.5 * extent[1]],
        };
        let axis = |n: usize, i: usize| -> Real {
            let usable = 1.0 - 2.0 * self.margin;
            let t = if cell_centers {
                (i as Real + 0.5) / n as Real
            } else if n <= 1 {
                0.5
            } else {
                i as Real / (n - 1) as Real
            };
            self.margin + usable * t
        };
        let mut out = Vec::with_capacity(dims[0] * dims[1]);
        for row in 0..dims[1] {
            for col in 0..dims[0] {
                out.push([
                    origin[0] + extent[0] * axis(dims[0], col),
                    origin[1] + extent[1] * axis(dims[1], row),
                ]);
            }
        }
        out
    }

    fn render(
        &self,
        config: &ScenarioConfig,
        truths: Vec<[Real; 2]>,
        first_frame: usize,
    ) -> Vec<LabeledSample> {
        let params = config.parameters();
        let offset = config.wcs_offset();
        let noise = UniformPixelNoise::new(self.seed, self.noise_px);
        let mut samples = Vec::with_capacity(truths.len());
        for (idx, truth) in truths.into_iter().enumerate() {
            let eye = self.eye_positions[idx % self.eye_positions.len()];
            let target = config.target_world(truth) + offset;
            let pose = EyePose::looking_at(&params.eye, Pt3::from(eye) + offset, &target);
            match observe(&params, &pose) {
                Some(obs) => {
                    let observation = if self.noise_px > 0.0 {
                        noise.apply_to_observation(first_frame + idx, &obs)
                    } else {
                        obs
                    };
                    samples.push(LabeledSample { observation, truth });
                }
                None => debug!("synthetic target {truth:?} has no valid observation, skipped"),
            }
        }
        samples
    }

    pub fn generate(&self, config: &ScenarioConfig) -> Result<SessionInput> {
        ensure!(
            !self.eye_positions.is_empty(),
            "synthetic session needs at least one eye position"
        );
        ensure!(
            (0.0..0.5).contains(&self.margin),
            "margin must be in [0, 0.5), got {}",
            self.margin
        );
        let calibration = self.render(config, self.grid(config, self.calibration_grid, false), 0);
        let test = self.render(
            config,
            self.grid(config, self.test_grid, true),
            calibration.len(),
        );
        debug!(
            "synthetic session for '{}': {} calibration, {} test samples",
            config.name,
            calibration.len(),
            test.len()
        );
        Ok(SessionInput { calibration, test })
    }
}
