//! Capture orchestration.
//!
//! [`CaptureOrchestrator`] is the state machine behind a dataset run. It works
//! on one model at a time:
//!
//! 1. `start` captures the origin camera pose and dequeues the first model
//! 2. `pre_render` places the camera for the current orbit step and binds a
//!    random background
//! 3. `advance` receives the rasterized frame, asks the host for the depth and
//!    normal passes over it, writes the image triple and moves to the next step
//! 4. after a full revolution the model is destroyed and the next one dequeued;
//!    when the queue is empty `advance` answers [`CaptureCommand::Stop`]
//!
//! The orchestrator does not know any rendering API. Everything it needs from
//! the host goes through [`ShadingPasses`], see [`crate::flow`] for the driver.
//!
//! # Output layout
//!
//! `<output_root>/<logical model path>/{Base,Depth,Normal}/cameraAngle{angle}.png`
//!
//! File names only encode the angle, so they are unique because every model
//! gets its own directory and is orbited exactly once.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use cgmath::{Deg, One, Point3, Quaternion};
use image::{ImageFormat, RgbImage};
use instant::Instant;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{
    camera::{Camera, OrbitJitter, orbit_pose},
    config::CaptureConfig,
    data_structures::{
        model::ModelInstance,
        texture::{Background, Color, EnvironmentSlot},
        transform::Transform,
    },
    error::{CaptureError, Result},
    flow::{FrameView, ShadingPass, ShadingPasses},
    resources::{LogicalPath, environment::EnvironmentSelector, model_queue::ModelQueue},
};

pub const BASE_FOLDER: &str = "Base";
pub const DEPTH_FOLDER: &str = "Depth";
pub const NORMAL_FOLDER: &str = "Normal";

const FULL_REVOLUTION: f32 = 360.0;

/// Answer of [`CaptureOrchestrator::advance`] to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Continue,
    /// The queue is exhausted; the host should stop.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No model loaded yet.
    Idle,
    Orbiting { step: u32 },
    Finished,
}

/// Totals of a run, reported when it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub models_completed: usize,
    pub models_skipped: usize,
    pub steps_captured: u64,
}

/// Orbit angle in degrees at `step`.
pub fn orbit_angle(step: u32, angle_step: f32) -> f32 {
    step as f32 * angle_step
}

pub fn orbit_complete(step: u32, angle_step: f32) -> bool {
    orbit_angle(step, angle_step) >= FULL_REVOLUTION - f32::EPSILON
}

/// `cameraAngle5.png`, `cameraAngle357.5.png`, ...
pub fn capture_filename(angle: f32) -> String {
    format!("cameraAngle{}.png", angle)
}

/// The three leaf folders of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectories {
    pub base: PathBuf,
    pub depth: PathBuf,
    pub normal: PathBuf,
}

impl OutputDirectories {
    pub fn for_model(output_root: &Path, model: &LogicalPath) -> Self {
        let model_root = output_root.join(model.to_relative_path());
        Self {
            base: model_root.join(BASE_FOLDER),
            depth: model_root.join(DEPTH_FOLDER),
            normal: model_root.join(NORMAL_FOLDER),
        }
    }

    pub fn create(&self) -> Result<()> {
        for dir in [&self.base, &self.depth, &self.normal] {
            std::fs::create_dir_all(dir).map_err(|source| CaptureError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write one capture triple under the same file name.
    ///
    /// All three images are encoded and staged under a hidden temporary name
    /// first and only renamed into place once every staged write succeeded.
    /// On failure everything written for this triple is removed again, so a
    /// step either produces all three files or none.
    pub fn write_triple(
        &self,
        filename: &str,
        base: &RgbImage,
        depth: &RgbImage,
        normal: &RgbImage,
    ) -> Result<()> {
        let encoded = [
            (self.base.join(filename), base),
            (self.depth.join(filename), depth),
            (self.normal.join(filename), normal),
        ]
        .into_iter()
        .map(|(path, image)| encode_png(&path, image).map(|bytes| (path, bytes)))
        .collect::<Result<Vec<_>>>()?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(encoded.len());
        for (path, bytes) in encoded {
            let staging = staging_path(&path);
            if let Err(source) = std::fs::write(&staging, bytes) {
                discard(staged.iter().map(|(staging, _)| staging));
                discard([&staging]);
                return Err(CaptureError::WriteImage { path, source });
            }
            staged.push((staging, path));
        }

        for (index, (staging, path)) in staged.iter().enumerate() {
            if let Err(source) = std::fs::rename(staging, path) {
                discard(staged[..index].iter().map(|(_, path)| path));
                discard(staged[index..].iter().map(|(staging, _)| staging));
                return Err(CaptureError::WriteImage {
                    path: path.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

/// `Base/.cameraAngle5.png.tmp` next to `Base/cameraAngle5.png`.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn discard<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) {
    for path in paths.into_iter().filter(|path| path.exists()) {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Could not remove {:?} after a failed write: {}", path, e);
        }
    }
}

fn encode_png(path: &Path, image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|source| CaptureError::EncodeImage {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(bytes)
}

/// Per-model state; lives from dequeue until the orbit completes.
#[derive(Debug)]
struct CaptureSession {
    logical: LogicalPath,
    model: ModelInstance,
    step: u32,
    outputs: OutputDirectories,
    started: Instant,
}

pub struct CaptureOrchestrator {
    config: CaptureConfig,
    models: ModelQueue,
    environments: EnvironmentSelector,
    rng: StdRng,
    anchor: Transform,
    origin: Option<Camera>,
    camera: Camera,
    environment: EnvironmentSlot,
    session: Option<CaptureSession>,
    finished: bool,
    summary: RunSummary,
}

impl CaptureOrchestrator {
    pub fn new(
        config: CaptureConfig,
        models: ModelQueue,
        environments: EnvironmentSelector,
    ) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        log::info!("Capture seed: {}", seed);
        Ok(Self {
            anchor: config.anchor.into(),
            config,
            models,
            environments,
            rng: StdRng::seed_from_u64(seed),
            origin: None,
            camera: Camera::new(Point3::new(0.0, 0.0, 0.0), Quaternion::one()),
            environment: EnvironmentSlot::new(),
            session: None,
            finished: false,
            summary: RunSummary::default(),
        })
    }

    /// One-time setup: remember `camera` as the origin pose and dequeue the
    /// first model. An empty model catalog is an error, not an idle run.
    pub fn start(&mut self, camera: Camera) -> Result<()> {
        if self.models.is_empty() {
            return Err(CaptureError::EmptyCatalog {
                root: self.config.models_root.clone(),
            });
        }
        log::info!(
            "Capturing {} models, {} steps each",
            self.models.len(),
            self.config.steps_per_revolution()
        );
        self.origin = Some(camera);
        self.camera = camera;
        self.intake_next()
    }

    /// Place the camera for the current step and bind a random background.
    pub fn pre_render(&mut self) {
        let (Some(session), Some(origin)) = (&self.session, &self.origin) else {
            return;
        };
        let angle = orbit_angle(session.step, self.config.angle_step_degrees);
        let jitter = OrbitJitter::sample(&mut self.rng, &self.config);
        self.camera = orbit_pose(origin, session.model.position(), Deg(angle), &jitter);

        let background = match self.environments.random_skybox(&mut self.rng) {
            Some(texture) => Background::Environment {
                texture,
                tint: Color::GRAY,
            },
            None => Background::Color(Color::random_hsv(&mut self.rng)),
        };
        self.environment.bind(background);
    }

    /// Post-render step: capture `frame` and advance the orbit.
    ///
    /// The depth and normal images are produced by `passes` from the same
    /// frame, and the triple is on disk before the session may change.
    pub fn advance<P: ShadingPasses + ?Sized>(
        &mut self,
        frame: &RgbImage,
        passes: &mut P,
    ) -> Result<CaptureCommand> {
        let angle_step = self.config.angle_step_degrees;
        let Some(session) = self.session.as_mut() else {
            return Ok(if self.finished {
                CaptureCommand::Stop
            } else {
                CaptureCommand::Continue
            });
        };

        let filename = capture_filename(orbit_angle(session.step, angle_step));
        let depth = run_pass(passes, frame, ShadingPass::Depth)?;
        let normal = run_pass(passes, frame, ShadingPass::Normal)?;
        session
            .outputs
            .write_triple(&filename, frame, &depth, &normal)?;
        log::debug!("{}: captured {}", session.logical, filename);

        session.step += 1;
        self.summary.steps_captured += 1;

        if orbit_complete(session.step, angle_step) {
            self.finish_session();
            self.intake_next()?;
            if self.finished {
                return Ok(CaptureCommand::Stop);
            }
        }
        Ok(CaptureCommand::Continue)
    }

    /// Release the bound environment and destroy the live model, if any.
    pub fn shutdown(&mut self) {
        self.environment.release();
        if let Some(session) = self.session.take() {
            log::warn!(
                "{} destroyed at step {} before its orbit completed",
                session.logical,
                session.step
            );
        }
    }

    fn intake_next(&mut self) -> Result<()> {
        let Some((prefab, logical)) = self.models.retrieve_next() else {
            self.session = None;
            self.finished = true;
            self.summary.models_skipped = self.models.skipped().len();
            log::info!(
                "Model queue exhausted: {} models captured, {} skipped, {} steps",
                self.summary.models_completed,
                self.summary.models_skipped,
                self.summary.steps_captured
            );
            return Ok(());
        };

        let mut model = prefab.instantiate(&self.anchor);
        let normalized = model.normalize_materials();
        let outputs = OutputDirectories::for_model(&self.config.output_root, &logical);
        outputs.create()?;
        log::info!(
            "Capturing {} ({} materials normalized, {} models left)",
            logical,
            normalized,
            self.models.remaining()
        );

        self.session = Some(CaptureSession {
            logical,
            model,
            step: 0,
            outputs,
            started: Instant::now(),
        });
        Ok(())
    }

    fn finish_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.summary.models_completed += 1;
            log::info!(
                "Finished {} after {} steps in {:.2?}",
                session.logical,
                session.step,
                session.started.elapsed()
            );
        }
    }

    pub fn state(&self) -> CaptureState {
        match (&self.session, self.finished) {
            (_, true) => CaptureState::Finished,
            (Some(session), false) => CaptureState::Orbiting { step: session.step },
            (None, false) => CaptureState::Idle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Everything the host needs to rasterize the current frame.
    pub fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            camera: &self.camera,
            background: self.environment.current(),
            model: self.model(),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn background(&self) -> &Background {
        self.environment.current()
    }

    pub fn environment_slot(&self) -> &EnvironmentSlot {
        &self.environment
    }

    pub fn model(&self) -> Option<&ModelInstance> {
        self.session.as_ref().map(|s| &s.model)
    }

    pub fn current_model_path(&self) -> Option<&LogicalPath> {
        self.session.as_ref().map(|s| &s.logical)
    }

    pub fn output_directories(&self) -> Option<&OutputDirectories> {
        self.session.as_ref().map(|s| &s.outputs)
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

fn run_pass<P: ShadingPasses + ?Sized>(
    passes: &mut P,
    frame: &RgbImage,
    pass: ShadingPass,
) -> Result<RgbImage> {
    let image = passes.blit(frame, pass)?;
    if image.dimensions() != frame.dimensions() {
        return Err(CaptureError::FrameMismatch {
            pass,
            expected: frame.dimensions(),
            actual: image.dimensions(),
        });
    }
    Ok(image)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
