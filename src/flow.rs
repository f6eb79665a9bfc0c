//! Host adapter and frame loop.
//!
//! This module connects a [`CaptureOrchestrator`] to a rendering host. The host
//! is anything that implements [`RenderHost`]: a GPU engine, a game engine
//! plugin, or the CPU-only [`crate::headless::HeadlessHost`].
//!
//! # Lifecycle
//!
//! [`run`] calls the host hooks in this order:
//! 1. `on_start()` once; the host prepares its depth and normal shading programs
//!    and reports the initial camera pose
//! 2. per frame: the orchestrator's pre-render phase, `rasterize()`, the
//!    orchestrator's post-render phase (which calls `blit()` twice), then
//!    `present()` with the untouched base frame
//! 3. `request_stop()` once the model queue is exhausted or the run fails
//! 4. `on_disable()` once, also when the run fails

use image::RgbImage;

use crate::{
    camera::Camera,
    capture::{CaptureCommand, CaptureOrchestrator, RunSummary},
    data_structures::{model::ModelInstance, texture::Background},
    error::Result,
};

/// Offscreen passes run over an already rasterized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingPass {
    /// Scene depth encoded as grayscale.
    Depth,
    /// View-space normals encoded as RGB.
    Normal,
}

/// The capture operations the orchestrator requests from its host.
pub trait ShadingPasses {
    /// Render `frame` again through the depth- or normal-encoding transform.
    /// The result must have the frame's dimensions.
    fn blit(&mut self, frame: &RgbImage, pass: ShadingPass) -> Result<RgbImage>;
}

/// What the host renders in a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub camera: &'a Camera,
    pub background: &'a Background,
    pub model: Option<&'a ModelInstance>,
}

/// Hooks a rendering host provides to the capture loop.
pub trait RenderHost: ShadingPasses {
    /// One-time initialization. Returns the camera pose the orbit starts from.
    fn on_start(&mut self) -> Result<Camera>;

    /// Render the scene described by `view` and read the frame back.
    fn rasterize(&mut self, view: &FrameView<'_>) -> Result<RgbImage>;

    /// Forward the base frame to the host's own presentation.
    fn present(&mut self, frame: RgbImage);

    /// The run is over: stop playback or end the process.
    fn request_stop(&mut self);

    /// Release the shading programs built in `on_start`.
    fn on_disable(&mut self);
}

/// Drive `orchestrator` with `host` until the model queue is exhausted.
pub fn run<H: RenderHost + ?Sized>(
    host: &mut H,
    orchestrator: &mut CaptureOrchestrator,
) -> Result<RunSummary> {
    let result = drive(host, orchestrator);
    if let Err(e) = &result {
        log::error!("Capture run aborted: {}", e);
        host.request_stop();
    }
    orchestrator.shutdown();
    host.on_disable();
    result.map(|_| orchestrator.summary().clone())
}

fn drive<H: RenderHost + ?Sized>(host: &mut H, orchestrator: &mut CaptureOrchestrator) -> Result<()> {
    let camera = host.on_start()?;
    orchestrator.start(camera)?;

    // Every catalog entry may have failed to load.
    if orchestrator.is_finished() {
        host.request_stop();
        return Ok(());
    }

    loop {
        orchestrator.pre_render();
        let frame = host.rasterize(&orchestrator.frame_view())?;
        let command = orchestrator.advance(&frame, host)?;
        host.present(frame);
        if command == CaptureCommand::Stop {
            host.request_stop();
            return Ok(());
        }
    }
}
