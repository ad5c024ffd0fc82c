//! Records rendered frames into an animation whose length is one period of
//! the simulation's threshold oscillation.

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::renderer::Raster;

pub mod artifact;
pub mod encoder;

pub use artifact::{ArtifactStore, FileArtifactStore, MemoryArtifactStore};
pub use encoder::{
    EncoderConfig, EncoderEvent, EncoderFactory, FrameEncoder, GifEncoderFactory, GifFrameEncoder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Inactive,
    Capturing,
    Rendering,
    Finished,
    /// The encoder gave up; only `reset` leaves this state
    Failed,
}

type ProgressFn = Box<dyn FnMut(&str)>;
type ResetFn = Box<dyn FnMut(bool)>;
type LinkFn = Box<dyn FnMut(&str)>;

/// Notifications a capture session reports back to the UI
pub struct CaptureCallbacks {
    progress: ProgressFn,
    reset: ResetFn,
    link: LinkFn,
}

impl CaptureCallbacks {
    pub fn new(
        progress: impl FnMut(&str) + 'static,
        reset: impl FnMut(bool) + 'static,
        link: impl FnMut(&str) + 'static,
    ) -> Self {
        Self {
            progress: Box::new(progress),
            reset: Box::new(reset),
            link: Box::new(link),
        }
    }

    /// Callbacks that ignore every notification
    pub fn silent() -> Self {
        Self::new(|_| {}, |_| {}, |_| {})
    }
}

struct CaptureSession {
    encoder: Box<dyn FrameEncoder>,
    is_rendering: bool,
    target_frame_count: u64,
    frames_added: u64,
    callbacks: CaptureCallbacks,
}

/// Frames needed to cover one oscillation period at the capture rate.
/// Saturates when the period is unbounded, which makes the session run forever.
pub fn target_frame_count(config: &CaptureConfig, time_multiplier: f32) -> u64 {
    let frames = (1.0 / (config.time_units_per_second * f64::from(time_multiplier)))
        * config.period_radians
        * config.fps;
    if frames.is_finite() && frames >= 0.0 {
        frames.floor() as u64
    } else {
        log::warn!(
            "Time multiplier {time_multiplier} gives no finite capture length; capture will not finish"
        );
        u64::MAX
    }
}

/// Capture state machine. Owned by the paint loop and stepped once per cycle.
pub struct CapturePipeline {
    config: CaptureConfig,
    factory: Box<dyn EncoderFactory>,
    store: Box<dyn ArtifactStore>,
    state: CaptureState,
    session: Option<CaptureSession>,
    artifact: Option<String>,
}

impl CapturePipeline {
    pub fn new(
        config: CaptureConfig,
        factory: Box<dyn EncoderFactory>,
        store: Box<dyn ArtifactStore>,
    ) -> Self {
        Self {
            config,
            factory,
            store,
            state: CaptureState::Inactive,
            session: None,
            artifact: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Capturing or rendering; the loop ticks at the capture rate meanwhile
    pub fn is_active(&self) -> bool {
        matches!(self.state, CaptureState::Capturing | CaptureState::Rendering)
    }

    pub fn target_frame_count(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.target_frame_count)
    }

    pub fn frames_added(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frames_added)
    }

    /// Reference to the finished animation, until the next reset
    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Arm a new session. Returns `false` without touching the running
    /// session when one is already capturing or rendering.
    pub fn start(
        &mut self,
        time_multiplier: f32,
        global_palette: Vec<u8>,
        width: u32,
        height: u32,
        mut callbacks: CaptureCallbacks,
    ) -> bool {
        if self.is_active() {
            log::debug!("Capture already running, start ignored");
            return false;
        }
        if self.state != CaptureState::Inactive {
            self.reset();
        }

        let target = target_frame_count(&self.config, time_multiplier);
        let encoder = self.factory.create(EncoderConfig {
            workers: self.config.workers,
            global_palette,
            quality: self.config.quality,
            width,
            height,
        });
        log::info!("Capture started, {target} frames to record");

        (callbacks.progress)("Capturing Frames...");
        self.session = Some(CaptureSession {
            encoder,
            is_rendering: false,
            target_frame_count: target,
            frames_added: 0,
            callbacks,
        });
        self.state = CaptureState::Capturing;
        true
    }

    /// One cycle: deliver encoder events, then record `frame` or finalize
    pub fn step(&mut self, frame: &Raster) {
        self.poll_encoder();

        if self.state != CaptureState::Capturing {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.frames_added <= session.target_frame_count {
            session.encoder.add_frame(frame, self.config.frame_delay_ms);
            session.frames_added += 1;
        } else {
            self.state = CaptureState::Rendering;
            if !session.is_rendering {
                session.is_rendering = true;
                log::info!("Rendering {} captured frames", session.frames_added);
                session.encoder.render();
            }
        }
    }

    /// Back to `Inactive` from any state, dropping the encoder and revoking
    /// any published artifact.
    pub fn reset(&mut self) {
        self.session = None;
        if let Some(reference) = self.artifact.take() {
            if let Err(err) = self.store.revoke(&reference) {
                log::warn!("Failed to revoke {reference}: {err}");
            }
        }
        if self.state != CaptureState::Inactive {
            log::info!("Capture reset");
        }
        self.state = CaptureState::Inactive;
    }

    fn poll_encoder(&mut self) {
        let mut events = Vec::new();
        if let Some(session) = self.session.as_mut() {
            while let Some(event) = session.encoder.poll_event() {
                events.push(event);
            }
        }

        for event in events {
            match event {
                EncoderEvent::Progress(fraction) => {
                    log::debug!("Encoder progress {fraction:.2}");
                    if let Some(session) = self.session.as_mut() {
                        let percent = (fraction * 100.0).floor();
                        (session.callbacks.progress)(&format!("Rendering {percent}%..."));
                    }
                }
                EncoderEvent::Finished(bytes) => {
                    let size = bytes.len();
                    match self.store.publish(bytes) {
                        Ok(reference) => self.finish(reference, size),
                        Err(err) => self.fail(err),
                    }
                }
                EncoderEvent::Failed(reason) => self.fail(CaptureError::EncodeFailed(reason)),
            }
        }
    }

    fn finish(&mut self, reference: String, size: usize) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        log::info!("Capture finished, {size} bytes");
        self.state = CaptureState::Finished;
        (session.callbacks.progress)("done");
        (session.callbacks.reset)(true);
        (session.callbacks.link)(&reference);
        self.artifact = Some(reference);
    }

    fn fail(&mut self, error: CaptureError) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        log::error!("Capture failed: {error}");
        self.state = CaptureState::Failed;
        (session.callbacks.progress)(&format!("failed: {error}"));
        (session.callbacks.reset)(true);
    }
}
