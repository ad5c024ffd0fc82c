use futures::channel::mpsc::{self, TryRecvError, UnboundedReceiver, UnboundedSender};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::error::CaptureError;
use crate::renderer::Raster;

/// Speeds `image`'s GIF encoder accepts
const QUALITY_RANGE: std::ops::RangeInclusive<i32> = 1..=30;

/// Settings an encoder is created with for one capture session
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub workers: usize,
    /// Flat `r, g, b` bytes; every frame is quantised to exactly these colours
    pub global_palette: Vec<u8>,
    pub quality: i32,
    pub width: u32,
    pub height: u32,
}

/// Reported by an encoder while or after it renders
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderEvent {
    /// Fraction of frames encoded, 0 to 1
    Progress(f32),
    Finished(Vec<u8>),
    Failed(String),
}

/// Accumulates frames and renders them into an animation without blocking
/// the caller. Results come back through [`FrameEncoder::poll_event`].
pub trait FrameEncoder {
    /// Copy `frame` into the pending animation
    fn add_frame(&mut self, frame: &Raster, delay_ms: u16);

    fn frame_count(&self) -> usize;

    /// Start encoding the accumulated frames
    fn render(&mut self);

    /// Next pending event, `None` if nothing happened since the last poll
    fn poll_event(&mut self) -> Option<EncoderEvent>;
}

pub trait EncoderFactory {
    fn create(&self, config: EncoderConfig) -> Box<dyn FrameEncoder>;
}

/// Builds [`GifFrameEncoder`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct GifEncoderFactory;

impl EncoderFactory for GifEncoderFactory {
    fn create(&self, config: EncoderConfig) -> Box<dyn FrameEncoder> {
        Box::new(GifFrameEncoder::new(config))
    }
}

struct PendingFrame {
    rgba: Vec<u8>,
    delay_ms: u16,
}

/// GIF encoder built on `image`. Encoding runs on a background thread natively
/// and inline on wasm; either way events are delivered through a channel.
pub struct GifFrameEncoder {
    config: EncoderConfig,
    frames: Vec<PendingFrame>,
    added: usize,
    sender: Option<UnboundedSender<EncoderEvent>>,
    receiver: UnboundedReceiver<EncoderEvent>,
    /// A `Finished` or `Failed` event has been handed out
    settled: bool,
}

impl GifFrameEncoder {
    /// `quality` outside `1..=30` is clamped into range.
    pub fn new(mut config: EncoderConfig) -> Self {
        let quality = config
            .quality
            .clamp(*QUALITY_RANGE.start(), *QUALITY_RANGE.end());
        if quality != config.quality {
            log::warn!("GIF quality {} out of range, using {quality}", config.quality);
            config.quality = quality;
        }
        let (sender, receiver) = mpsc::unbounded();
        Self {
            config,
            frames: Vec::new(),
            added: 0,
            sender: Some(sender),
            receiver,
            settled: false,
        }
    }

    pub fn quality(&self) -> i32 {
        self.config.quality
    }
}

impl FrameEncoder for GifFrameEncoder {
    fn add_frame(&mut self, frame: &Raster, delay_ms: u16) {
        self.frames.push(PendingFrame {
            rgba: frame.to_rgba_bytes(),
            delay_ms,
        });
        self.added += 1;
    }

    fn frame_count(&self) -> usize {
        self.added
    }

    fn render(&mut self) {
        let Some(sender) = self.sender.take() else {
            log::debug!("GIF render already started");
            return;
        };
        let config = self.config.clone();
        let frames = std::mem::take(&mut self.frames);
        log::info!("Encoding {} frames", frames.len());
        let failure = sender.clone();
        if let Err(err) = spawn_job(move || run_job(&config, frames, &sender)) {
            log::error!("Failed to spawn encoder thread: {err}");
            let _ = failure.unbounded_send(EncoderEvent::Failed(format!(
                "could not start encoder: {err}"
            )));
        }
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        if self.settled {
            return None;
        }
        let event = match self.receiver.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            // Every sender is gone without a result: the job died
            Err(TryRecvError::Closed) => {
                log::error!("GIF encoder stopped without a result");
                EncoderEvent::Failed("encoder stopped".to_owned())
            }
        };
        if !matches!(event, EncoderEvent::Progress(_)) {
            self.settled = true;
        }
        Some(event)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_job(job: impl FnOnce() + Send + 'static) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("gif-encoder".to_owned())
        .spawn(job)
        .map(|_| ())
}

#[cfg(target_arch = "wasm32")]
fn spawn_job(job: impl FnOnce() + Send + 'static) -> std::io::Result<()> {
    job();
    Ok(())
}

fn run_job(config: &EncoderConfig, mut frames: Vec<PendingFrame>, sender: &UnboundedSender<EncoderEvent>) {
    let palette = palette_colors(&config.global_palette);
    quantize_frames(&mut frames, &palette, config.workers);

    let event = match encode_gif(config, frames, sender) {
        Ok(bytes) => EncoderEvent::Finished(bytes),
        Err(err) => EncoderEvent::Failed(err.to_string()),
    };
    // The session may have been reset in the meantime
    let _ = sender.unbounded_send(event);
}

fn encode_gif(
    config: &EncoderConfig,
    frames: Vec<PendingFrame>,
    sender: &UnboundedSender<EncoderEvent>,
) -> Result<Vec<u8>, CaptureError> {
    let total = frames.len().max(1);
    let expected = (config.width * config.height * 4) as usize;
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, config.quality);
        encoder.set_repeat(Repeat::Infinite)?;

        for (i, frame) in frames.into_iter().enumerate() {
            let actual = frame.rgba.len();
            let image = RgbaImage::from_raw(config.width, config.height, frame.rgba).ok_or(
                CaptureError::FrameSizeMismatch {
                    expected: expected / 4,
                    actual: actual / 4,
                },
            )?;
            let delay = Delay::from_numer_denom_ms(u32::from(frame.delay_ms), 1);
            encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
            let _ = sender.unbounded_send(EncoderEvent::Progress((i + 1) as f32 / total as f32));
        }
    }
    Ok(bytes)
}

fn palette_colors(flat: &[u8]) -> Vec<[u8; 3]> {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

/// Snap every pixel to the nearest palette colour, splitting frames across workers
fn quantize_frames(frames: &mut [PendingFrame], palette: &[[u8; 3]], workers: usize) {
    if palette.is_empty() || frames.is_empty() {
        return;
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let chunk = frames.len().div_ceil(workers.max(1));
        std::thread::scope(|scope| {
            for group in frames.chunks_mut(chunk) {
                scope.spawn(move || {
                    for frame in group {
                        quantize(&mut frame.rgba, palette);
                    }
                });
            }
        });
    }

    #[cfg(target_arch = "wasm32")]
    {
        let _ = workers;
        for frame in frames {
            quantize(&mut frame.rgba, palette);
        }
    }
}

fn quantize(rgba: &mut [u8], palette: &[[u8; 3]]) {
    for pixel in rgba.chunks_exact_mut(4) {
        let nearest = nearest_color([pixel[0], pixel[1], pixel[2]], palette);
        pixel[..3].copy_from_slice(&nearest);
        pixel[3] = 0xFF;
    }
}

fn nearest_color(rgb: [u8; 3], palette: &[[u8; 3]]) -> [u8; 3] {
    let dist = |c: &[u8; 3]| -> u32 {
        (0..3)
            .map(|i| {
                let d = i32::from(rgb[i]) - i32::from(c[i]);
                (d * d) as u32
            })
            .sum()
    };
    palette
        .iter()
        .min_by_key(|c| dist(c))
        .copied()
        .unwrap_or(rgb)
}
