#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use blob_paint::capture::{
    ArtifactStore, CaptureCallbacks, EncoderConfig, EncoderEvent, EncoderFactory, FrameEncoder,
    MemoryArtifactStore,
};
use blob_paint::config::PaintConfig;
use blob_paint::driver::{FrameScheduler, PaintLoop};
use blob_paint::engine::{BrushHandle, SimulationEngine, ToolKind};
use blob_paint::error::CaptureError;
use blob_paint::renderer::{Raster, Surface};
use egui::{Color32, Pos2, Rect, pos2, vec2};

/// Engine call as seen by the recording engine
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Tick(u32),
    Apply(f32, f32, ToolKind),
    Remove(f32, f32, ToolKind),
    PushUndo,
    PopUndo(bool),
    Clear,
    Flip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingBrush {
    pub kind: ToolKind,
    pub size: f32,
    pub velocity: (f32, f32),
}

impl BrushHandle for RecordingBrush {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    fn set_curve(&mut self, _curve: f32) {}

    fn set_strength(&mut self, _strength: f32) {}

    fn set_color(&mut self, _color: f32) {}

    fn set_outliner_height(&mut self, _height: f32) {}

    fn set_velocity(&mut self, dx: f32, dy: f32) {
        self.velocity = (dx, dy);
    }

    fn supports_velocity(&self) -> bool {
        self.kind == ToolKind::Smudger
    }

    fn sample(&self, dist: f32) -> f32 {
        1.0 / (1.0 + dist)
    }
}

/// Engine double that records every call the loop makes
#[derive(Debug)]
pub struct RecordingEngine {
    pub width: u32,
    pub height: u32,
    pub calls: Vec<Call>,
    pub undo_depth: usize,
    pub thresh_time_multiplier: f32,
    /// `(x, y, index)` triples handed to the renderer
    pub draw_buffer: Vec<u8>,
}

impl RecordingEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            undo_depth: 0,
            thresh_time_multiplier: std::f32::consts::TAU / 1e6,
            draw_buffer: vec![0, 0, 2, 1, 1, 3],
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn ticks(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Tick(t) => Some(*t),
                _ => None,
            })
            .collect()
    }
}

impl SimulationEngine for RecordingEngine {
    type Brush = RecordingBrush;

    fn create_brush(&self, kind: ToolKind) -> RecordingBrush {
        RecordingBrush {
            kind,
            size: 24.0,
            velocity: (0.0, 0.0),
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tick(&mut self, micros: u32) {
        self.calls.push(Call::Tick(micros));
    }

    fn apply_brush(&mut self, x: f32, y: f32, brush: &RecordingBrush) {
        self.calls.push(Call::Apply(x, y, brush.kind));
    }

    fn remove_brush(&mut self, x: f32, y: f32, brush: &RecordingBrush) {
        self.calls.push(Call::Remove(x, y, brush.kind));
    }

    fn push_undo(&mut self) {
        self.undo_depth += 1;
        self.calls.push(Call::PushUndo);
    }

    fn try_pop_undo(&mut self) -> bool {
        let popped = self.undo_depth > 0;
        if popped {
            self.undo_depth -= 1;
        }
        self.calls.push(Call::PopUndo(popped));
        popped
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn flip_horizontal(&mut self) {
        self.calls.push(Call::Flip);
    }

    fn draw_buffer_size(&self) -> usize {
        self.draw_buffer.len() / 3
    }

    fn fill_draw_buffer(&mut self) {}

    fn draw_buffer(&self) -> &[u8] {
        &self.draw_buffer
    }

    fn sample_pixel(&mut self, _x: u32, _y: u32) -> u8 {
        2
    }

    fn set_thresh_base(&mut self, _value: f32) {}

    fn set_thresh_variance(&mut self, _value: f32) {}

    fn set_thresh_time_multiplier(&mut self, value: f32) {
        self.thresh_time_multiplier = value;
    }

    fn thresh_time_multiplier(&self) -> f32 {
        self.thresh_time_multiplier
    }
}

/// Everything the recording encoders did, shared with the test
#[derive(Debug, Default)]
pub struct EncoderLog {
    pub created: Vec<EncoderConfig>,
    pub frames_added: usize,
    pub delays: Vec<u16>,
    pub render_calls: usize,
    /// Events handed out by `poll_event`, queued by the test
    pub pending: VecDeque<EncoderEvent>,
}

pub type SharedLog = Rc<RefCell<EncoderLog>>;

pub struct RecordingEncoder {
    log: SharedLog,
    frames: usize,
}

impl FrameEncoder for RecordingEncoder {
    fn add_frame(&mut self, _frame: &Raster, delay_ms: u16) {
        self.frames += 1;
        let mut log = self.log.borrow_mut();
        log.frames_added += 1;
        log.delays.push(delay_ms);
    }

    fn frame_count(&self) -> usize {
        self.frames
    }

    fn render(&mut self) {
        self.log.borrow_mut().render_calls += 1;
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        self.log.borrow_mut().pending.pop_front()
    }
}

pub struct RecordingEncoderFactory(pub SharedLog);

impl EncoderFactory for RecordingEncoderFactory {
    fn create(&self, config: EncoderConfig) -> Box<dyn FrameEncoder> {
        self.0.borrow_mut().created.push(config);
        Box::new(RecordingEncoder {
            log: Rc::clone(&self.0),
            frames: 0,
        })
    }
}

/// Artifact store the test can still inspect after handing it over
#[derive(Clone, Default)]
pub struct SharedStore(pub Rc<RefCell<MemoryArtifactStore>>);

impl ArtifactStore for SharedStore {
    fn publish(&mut self, bytes: Vec<u8>) -> Result<String, CaptureError> {
        self.0.borrow_mut().publish(bytes)
    }

    fn revoke(&mut self, reference: &str) -> Result<(), CaptureError> {
        self.0.borrow_mut().revoke(reference)
    }
}

#[derive(Debug, Default)]
pub struct CountingScheduler {
    pub requests: usize,
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&mut self) {
        self.requests += 1;
    }
}

/// Everything the capture callbacks reported
#[derive(Debug, Default)]
pub struct CallbackLog {
    pub progress: Vec<String>,
    pub resets: Vec<bool>,
    pub links: Vec<String>,
}

pub fn recording_callbacks() -> (CaptureCallbacks, Rc<RefCell<CallbackLog>>) {
    let log = Rc::new(RefCell::new(CallbackLog::default()));
    let (progress, reset, link) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
    let callbacks = CaptureCallbacks::new(
        move |text| progress.borrow_mut().progress.push(text.to_owned()),
        move |enabled| reset.borrow_mut().resets.push(enabled),
        move |url| link.borrow_mut().links.push(url.to_owned()),
    );
    (callbacks, log)
}

pub struct Harness {
    pub paint: PaintLoop<RecordingEngine>,
    pub encoders: SharedLog,
    pub store: SharedStore,
    pub scheduler: CountingScheduler,
    pub now: f64,
}

impl Harness {
    /// 64x64 engine drawn into a 100x100 rect at the origin
    pub fn new() -> Self {
        let encoders = SharedLog::default();
        let store = SharedStore::default();
        let mut paint = PaintLoop::new(
            RecordingEngine::new(64, 64),
            &PaintConfig::default(),
            Box::new(RecordingEncoderFactory(Rc::clone(&encoders))),
            Box::new(store.clone()),
        );
        paint.set_canvas_rect(Some(Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0))));
        Self {
            paint,
            encoders,
            store,
            scheduler: CountingScheduler::default(),
            now: 0.0,
        }
    }

    /// Run one cycle `dt_ms` after the previous one
    pub fn cycle(&mut self, dt_ms: f64) -> blob_paint::driver::CycleReport {
        self.now += dt_ms;
        self.paint.cycle(self.now, &mut self.scheduler)
    }

    pub fn engine(&self) -> &RecordingEngine {
        self.paint.engine()
    }
}

/// Surface that records every block it is asked to fill
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub fills: Vec<(u32, u32, u32, u32)>,
    pub texts: Vec<String>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, _color: Color32) {
        self.fills.push((x, y, w, h));
    }

    fn fill_text(&mut self, text: &str, _position: Pos2, _color: Color32) {
        self.texts.push(text.to_owned());
    }
}
