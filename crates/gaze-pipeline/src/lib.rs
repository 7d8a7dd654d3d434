//! Scenario-level gaze estimation workflows.
//!
//! - [`config`]: serializable scenario description and the two reference
//!   scenarios,
//! - [`layout`]: which parameters a calibration fits and within which bounds,
//! - [`session`]: labeled sample sets and a synthetic session generator,
//! - [`run`]: calibration, evaluation and whole-session runs with JSON
//!   friendly reports.
//!
//! ```no_run
//! use gaze_pipeline::{run_session, ScenarioConfig, SessionInput};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ScenarioConfig::load("scenario.json")?;
//! let samples = SessionInput::load("samples.json")?;
//! let report = run_session(&config, &samples, true)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod layout;
pub mod run;
pub mod session;

pub use config::{CalibrationConfig, GroundTruthUnits, ScenarioConfig};
pub use layout::{CalibratedField, CalibrationLayout, CalibrationVariable};
pub use run::{
    evaluate, run_calibration, run_session, CalibrationRun, EvaluationReport, FailedSample,
    FittedVariable, SampleError, SessionReport,
};
pub use session::{LabeledSample, SessionInput, SyntheticSession};
