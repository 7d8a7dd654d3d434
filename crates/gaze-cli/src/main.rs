use std::{error::Error, path::Path};

use clap::{Parser, ValueEnum};
use gaze_pipeline::{run_session, ScenarioConfig, SessionInput, SyntheticSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// One camera below the screen, ground truth in screen pixels.
    Single,
    /// Two cameras, ground truth in centimeters.
    Two,
}

/// Calibrate and evaluate a gaze estimation scenario.
#[derive(Debug, Parser)]
#[command(author, version, about = "Gaze estimation calibration and evaluation")]
struct Args {
    /// Path to a JSON ScenarioConfig. Overrides --preset.
    #[arg(long)]
    config: Option<String>,

    /// Built-in scenario used when no config file is given.
    #[arg(long, value_enum, default_value_t = Preset::Single)]
    preset: Preset,

    /// Path to JSON samples ({"calibration": [...], "test": [...]}). A
    /// synthetic session is rendered from the scenario when omitted.
    #[arg(long)]
    samples: Option<String>,

    /// Image noise bound for synthetic samples, in pixels.
    #[arg(long, default_value_t = 0.0)]
    noise_px: f64,

    /// Evaluate with the configured parameters only.
    #[arg(long)]
    no_calibrate: bool,
}

fn load_config(
    config_path: Option<&str>,
    preset: Preset,
) -> Result<ScenarioConfig, Box<dyn Error>> {
    Ok(match config_path {
        Some(path) => ScenarioConfig::load(Path::new(path))?,
        None => match preset {
            Preset::Single => ScenarioConfig::single_camera_reference(),
            Preset::Two => ScenarioConfig::two_camera_reference(),
        },
    })
}

fn run_from_files(args: &Args) -> Result<String, Box<dyn Error>> {
    let config = load_config(args.config.as_deref(), args.preset)?;
    let samples = match &args.samples {
        Some(path) => SessionInput::load(Path::new(path))?,
        None => {
            let mut synth = SyntheticSession {
                noise_px: args.noise_px,
                ..SyntheticSession::default()
            };
            if args.config.is_none() && args.preset == Preset::Two {
                synth.eye_positions = vec![[0.5, 2.0, 62.0]];
            }
            synth.generate(&config)?
        }
    };
    let report = run_session(&config, &samples, !args.no_calibrate)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let json = run_from_files(&args)?;
    println!("{}", json);
    Ok(())
}
