//! The single control loop: one [`PaintLoop::cycle`] per display refresh.

use std::cell::Cell;

use egui::{Color32, Rect};
use serde::{Deserialize, Serialize};

use crate::capture::{ArtifactStore, CaptureCallbacks, CapturePipeline, EncoderFactory};
use crate::config::{FrameRateConfig, PaintConfig};
use crate::engine::SimulationEngine;
use crate::history::UndoCoordinator;
use crate::input::{DeviceEvent, PointerState, PointerTracker, StrokeEdge, VelocitySmoother};
use crate::palette::PaletteBook;
use crate::renderer::{InteractiveTab, Raster, Renderer};
use crate::tools::{DispatchOutcome, Toolbox, dispatch_brush};
use crate::util::time;

/// Exponential moving average of the display frame rate
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRateEstimate {
    avg: f64,
    k: f64,
}

impl FrameRateEstimate {
    pub fn new(seed_fps: f64, k: f64) -> Self {
        Self { avg: seed_fps, k }
    }

    pub fn from_config(config: &FrameRateConfig) -> Self {
        Self::new(config.seed_fps, config.smoothing_k)
    }

    pub fn avg(&self) -> f64 {
        self.avg
    }

    /// Blend in the rate implied by `dt_ms`. Non-positive deltas are ignored.
    pub fn update(&mut self, dt_ms: f64) -> bool {
        if dt_ms.is_nan() || dt_ms <= 0.0 {
            return false;
        }
        let fps = 1000.0 / dt_ms;
        self.avg = (self.avg * self.k + fps) / (self.k + 1.0);
        true
    }
}

/// Source of cycle timestamps in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        time::now_ms()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Re-arms the loop for the next display refresh
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Threshold field parameters exposed as sliders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
    pub base: f32,
    pub variance: f32,
    /// Radians of oscillation phase per simulated time unit
    pub time_multiplier: f32,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            base: 0.4,
            variance: 0.095,
            time_multiplier: std::f32::consts::TAU / 1e6,
        }
    }
}

/// What one cycle did, for hosts and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub dt_ms: f64,
    pub dispatch: DispatchOutcome,
    /// Simulated time units passed to `tick`
    pub tick: u32,
}

/// Owns every piece of paint state and drives it one cycle at a time.
pub struct PaintLoop<E: SimulationEngine> {
    engine: E,
    tools: Toolbox<E::Brush>,
    tracker: PointerTracker,
    smoother: VelocitySmoother,
    undo: UndoCoordinator,
    capture: CapturePipeline,
    renderer: Renderer,
    raster: Raster,
    palettes: PaletteBook,
    thresholds: ThresholdSettings,
    tab: InteractiveTab,
    frame_rate: FrameRateEstimate,
    prev_timestamp: Option<f64>,
    time_units_per_second: f64,
}

impl<E: SimulationEngine> PaintLoop<E> {
    pub fn new(
        engine: E,
        config: &PaintConfig,
        encoders: Box<dyn EncoderFactory>,
        artifacts: Box<dyn ArtifactStore>,
    ) -> Self {
        let tools = Toolbox::new(&engine);
        let palettes = PaletteBook::default();
        let raster = Raster::new(engine.width(), engine.height(), palettes.active_colors()[2]);
        let mut this = Self {
            tools,
            tracker: PointerTracker::new(),
            smoother: VelocitySmoother::new(config.pointer.smoothing_k, config.pointer.velocity_mult),
            undo: UndoCoordinator::new(),
            capture: CapturePipeline::new(config.capture.clone(), encoders, artifacts),
            renderer: Renderer::new(&config.render),
            raster,
            palettes,
            thresholds: ThresholdSettings::default(),
            tab: InteractiveTab::default(),
            frame_rate: FrameRateEstimate::from_config(&config.frame_rate),
            prev_timestamp: None,
            time_units_per_second: config.capture.time_units_per_second,
            engine,
        };
        this.set_thresholds(ThresholdSettings::default());
        this
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn tools(&self) -> &Toolbox<E::Brush> {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut Toolbox<E::Brush> {
        &mut self.tools
    }

    pub fn pointer(&self) -> &PointerState {
        self.tracker.state()
    }

    pub fn undo_coordinator(&self) -> &UndoCoordinator {
        &self.undo
    }

    pub fn capture(&self) -> &CapturePipeline {
        &self.capture
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn palettes(&self) -> &PaletteBook {
        &self.palettes
    }

    pub fn palettes_mut(&mut self) -> &mut PaletteBook {
        &mut self.palettes
    }

    pub fn frame_rate(&self) -> &FrameRateEstimate {
        &self.frame_rate
    }

    pub fn tab(&self) -> InteractiveTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: InteractiveTab) {
        self.tab = tab;
    }

    pub fn thresholds(&self) -> ThresholdSettings {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: ThresholdSettings) {
        self.engine.set_thresh_base(thresholds.base);
        self.engine.set_thresh_variance(thresholds.variance);
        self.engine.set_thresh_time_multiplier(thresholds.time_multiplier);
        self.thresholds = thresholds;
    }

    /// Canvas rectangle in client coordinates, `None` while not laid out
    pub fn set_canvas_rect(&mut self, rect: Option<Rect>) {
        self.tracker.set_canvas_rect(rect);
    }

    /// Feed one device event. A stroke's leading edge pushes its checkpoint
    /// before any brush is applied.
    pub fn handle_event(&mut self, event: &DeviceEvent) {
        match self.tracker.handle(event) {
            Some(StrokeEdge::Began) => {
                self.undo.begin_stroke(&mut self.engine);
            }
            Some(StrokeEdge::Ended) => self.undo.end_stroke(),
            None => {}
        }
    }

    pub fn undo(&mut self) -> bool {
        self.undo.undo(&mut self.engine)
    }

    pub fn clear(&mut self) {
        log::info!("Clearing canvas");
        self.engine.clear();
    }

    pub fn flip(&mut self) {
        log::info!("Flipping canvas");
        self.engine.flip_horizontal();
    }

    /// Arm a capture with the current period, palette and canvas size
    pub fn start_capture(&mut self, callbacks: CaptureCallbacks) -> bool {
        let time_multiplier = self.engine.thresh_time_multiplier();
        let palette = self.palettes.export_rgb();
        let [width, height] = [self.engine.width(), self.engine.height()];
        self.capture.start(time_multiplier, palette, width, height, callbacks)
    }

    pub fn reset_capture(&mut self) {
        self.capture.reset();
    }

    /// Run one cycle timed by `clock`
    pub fn step(&mut self, clock: &dyn Clock, scheduler: &mut dyn FrameScheduler) -> CycleReport {
        self.cycle(clock.now_ms(), scheduler)
    }

    /// One pass of the loop at timestamp `now_ms`: dispatch, smoothing, tick,
    /// render, capture, frame-rate update, then re-arm.
    pub fn cycle(&mut self, now_ms: f64, scheduler: &mut dyn FrameScheduler) -> CycleReport {
        let dt_ms = self.prev_timestamp.map_or(0.0, |prev| now_ms - prev);
        self.prev_timestamp = Some(now_ms);

        let dispatch = dispatch_brush(&mut self.engine, self.tracker.state(), &self.tools);

        if let Some(position) = self.tracker.state().position {
            let delta = self.smoother.update(position);
            self.tools.set_velocity(delta.x, delta.y);
        }

        let step = if self.capture.is_active() {
            self.capture.config().step_micros()
        } else {
            self.time_units_per_second / self.frame_rate.avg()
        };
        let tick = step as u32;
        self.engine.tick(tick);

        let overlay = (self.tab == InteractiveTab::Draw).then(|| self.frame_rate.avg());
        let colors = self.palettes.active_colors();
        self.renderer
            .render(&mut self.engine, &colors, &mut self.raster, overlay);

        self.capture.step(&self.raster);

        self.frame_rate.update(dt_ms);

        scheduler.request_frame();

        CycleReport {
            dt_ms,
            dispatch,
            tick,
        }
    }

    /// Background colour of the active palette
    pub fn background(&self) -> Color32 {
        self.palettes.active_colors()[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{GifEncoderFactory, MemoryArtifactStore};
    use crate::engine::BlobCanvas;
    use egui::{pos2, vec2};

    #[derive(Default)]
    struct Counter(usize);

    impl FrameScheduler for Counter {
        fn request_frame(&mut self) {
            self.0 += 1;
        }
    }

    fn paint_loop() -> PaintLoop<BlobCanvas> {
        let config = PaintConfig::default();
        let engine = BlobCanvas::new(32, 32).unwrap();
        let mut paint = PaintLoop::new(
            engine,
            &config,
            Box::new(GifEncoderFactory),
            Box::new(MemoryArtifactStore::new()),
        );
        paint.set_canvas_rect(Some(Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0))));
        paint
    }

    #[test]
    fn frame_rate_ignores_non_positive_dt() {
        let mut estimate = FrameRateEstimate::new(60.0, 20.0);
        assert!(!estimate.update(0.0));
        assert!(!estimate.update(-4.0));
        assert!(!estimate.update(f64::NAN));
        assert_eq!(estimate.avg(), 60.0);
    }

    #[test]
    fn frame_rate_moves_towards_measured_rate() {
        let mut estimate = FrameRateEstimate::new(60.0, 20.0);
        for _ in 0..500 {
            estimate.update(1000.0 / 30.0);
        }
        assert!((estimate.avg() - 30.0).abs() < 0.01);
    }

    #[test]
    fn first_cycle_has_zero_dt_and_rearms() {
        let mut paint = paint_loop();
        let mut scheduler = Counter::default();

        let report = paint.cycle(1234.0, &mut scheduler);
        assert_eq!(report.dt_ms, 0.0);
        assert_eq!(paint.frame_rate().avg(), 60.0);
        assert_eq!(scheduler.0, 1);

        let report = paint.cycle(1254.0, &mut scheduler);
        assert_eq!(report.dt_ms, 20.0);
        assert_eq!(scheduler.0, 2);
    }

    #[test]
    fn interactive_tick_follows_frame_rate() {
        let mut paint = paint_loop();
        let report = paint.cycle(0.0, &mut Counter::default());
        assert_eq!(report.tick, 1_000_000 / 60);
    }

    #[test]
    fn overlay_only_on_draw_tab() {
        let mut paint = paint_loop();
        let clock = ManualClock::new(0.0);
        let mut scheduler = Counter::default();

        paint.step(&clock, &mut scheduler);
        assert!(paint.raster().overlay().is_some());

        paint.set_tab(InteractiveTab::Export);
        clock.advance(16.0);
        paint.step(&clock, &mut scheduler);
        assert!(paint.raster().overlay().is_none());
    }

    #[test]
    fn held_stroke_checkpoints_once() {
        let mut paint = paint_loop();
        let mut scheduler = Counter::default();
        paint.handle_event(&DeviceEvent::PointerDown {
            position: pos2(50.0, 50.0),
            buttons: 1,
        });
        for i in 0..5 {
            paint.handle_event(&DeviceEvent::PointerMove {
                position: pos2(50.0 + i as f32, 50.0),
            });
            let report = paint.cycle(i as f64 * 16.0, &mut scheduler);
            assert_eq!(report.dispatch, DispatchOutcome::Applied);
        }
        paint.handle_event(&DeviceEvent::PointerUp {
            position: pos2(55.0, 50.0),
        });

        assert_eq!(paint.undo_coordinator().checkpoints_pushed(), 1);
        assert_eq!(paint.engine().undo_depth(), 1);
        assert!(paint.undo());
        assert!(!paint.undo());
    }
}
