//! `orbit-capture` command line tool.
//!
//! Builds the catalogs from the configured roots and runs a capture with the
//! bundled glTF loader and the headless host. Every flag overrides the value
//! from `--config`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use orbit_capture::{
    CaptureConfig, CaptureOrchestrator, flow,
    headless::HeadlessHost,
    resources::{environment::EnvironmentSelector, loader::FileAssetLoader, model_queue::ModelQueue},
};

#[derive(Parser, Debug)]
#[command(name = "orbit-capture", version, about = "Capture base/depth/normal image triples of orbiting 3D models")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory searched recursively for models
    #[arg(long)]
    models: Option<PathBuf>,

    /// Root directory searched recursively for environment maps
    #[arg(long)]
    environments: Option<PathBuf>,

    /// Dataset output directory
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    model_extension: Option<String>,

    #[arg(long)]
    environment_extension: Option<String>,

    /// Orbit increment in degrees
    #[arg(long)]
    angle_step: Option<f32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Seed for camera jitter and background selection
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<CaptureConfig> {
        let mut config = match &self.config {
            Some(path) => CaptureConfig::from_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => CaptureConfig::default(),
        };
        if let Some(models) = self.models {
            config.models_root = models;
        }
        if let Some(environments) = self.environments {
            config.environments_root = environments;
        }
        if let Some(output) = self.output {
            config.output_root = output;
        }
        if let Some(extension) = self.model_extension {
            config.model_extension = extension;
        }
        if let Some(extension) = self.environment_extension {
            config.environment_extension = extension;
        }
        if let Some(angle_step) = self.angle_step {
            config.angle_step_degrees = angle_step;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let config = Args::parse().into_config()?;

    let mut loader = FileAssetLoader::new();
    let environments = EnvironmentSelector::new(
        &config.environments_root,
        &config.environment_extension,
        config.color_pick_chance,
        &mut loader,
    )
    .context("Failed to build the environment catalog")?;
    let models = ModelQueue::new(
        &config.models_root,
        &config.model_extension,
        Box::new(loader),
    )
    .context("Failed to build the model catalog")?;

    let mut host = HeadlessHost::from_config(&config);
    let mut orchestrator = CaptureOrchestrator::new(config, models, environments)?;
    let summary = flow::run(&mut host, &mut orchestrator).context("Capture run aborted")?;

    log::info!(
        "Done: {} models, {} steps, {} skipped, {} frames presented",
        summary.models_completed,
        summary.steps_captured,
        summary.models_skipped,
        host.frames_presented()
    );
    Ok(())
}
