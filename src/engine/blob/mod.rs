//! Blob threshold field.
//!
//! Every pixel carries a blob height and a colour mix. A threshold sweeps over
//! time (phase shifted per row), so blob edges animate with a period of
//! `2π / thresh_t_mult` microseconds.

mod brush;
mod field;

use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::MAX_CANVAS_SIDE;
use crate::error::EngineError;

use super::{SimulationEngine, ToolKind};

pub use brush::BlobBrush;
pub use field::{FieldBuffer, FieldCursor, PointData};

const MAX_UNDOS: usize = 8;
const RNG_SEED: u64 = 0x0102_0304_0506_0708;
/// Share of the canvas resampled into the draw buffer each frame
const DRAW_FRACTION: f32 = 0.05;
/// Distance from the threshold that still counts as outline
const OUTLINE_BAND: f32 = 0.05;

/// Palette categories produced by sampling
pub mod category {
    pub const FILL_A: u8 = 0;
    pub const FILL_B: u8 = 1;
    pub const BACKGROUND: u8 = 2;
    pub const OUTLINE: u8 = 3;
}

pub struct BlobCanvas {
    width: u32,
    height: u32,
    thresh_base: f32,
    thresh_t_var: f32,
    thresh_t_mult: f32,
    field: FieldBuffer,
    undo_stack: VecDeque<Vec<PointData>>,
    draw_buffer: Vec<u8>,
    t: u64,
    rng: SmallRng,
}

impl std::fmt::Debug for BlobCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("t", &self.t)
            .field("undo_depth", &self.undo_stack.len())
            .finish()
    }
}

impl BlobCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(EngineError::InvalidDimensions { width, height });
        }

        let mut rng = SmallRng::seed_from_u64(RNG_SEED);
        let field = empty_field((width * height) as usize, &mut rng);
        let draw_points = (width as f32 * height as f32 * DRAW_FRACTION) as usize;

        Ok(Self {
            width,
            height,
            thresh_base: 0.4,
            thresh_t_var: 0.095,
            thresh_t_mult: (TAU / 1_000_000.0) as f32,
            field,
            undo_stack: VecDeque::with_capacity(MAX_UNDOS + 1),
            draw_buffer: vec![0; draw_points * 3],
            t: 0,
            rng,
        })
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.t
    }

    /// Published state of one pixel
    pub fn point(&self, x: u32, y: u32) -> PointData {
        self.field.visible()[self.index(x, y)]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    fn threshold_at_row(&self, y: u32) -> f32 {
        let phase = self.t as f64 * self.thresh_t_mult as f64 + TAU * y as f64 / self.height as f64;
        self.thresh_base + self.thresh_t_var * phase.sin() as f32
    }

    fn stamp(&mut self, x_norm: f32, y_norm: f32, brush: &BlobBrush, remove: bool) {
        let rad = (brush.size() / 2.0) as i32;
        let px = (x_norm * self.width as f32).floor() as i32;
        let py = (y_norm * self.height as f32).floor() as i32;

        let x_min = (px - rad).max(0);
        let x_max = (px + rad).min(self.width as i32);
        let y_min = (py - rad).max(0);
        let y_max = (py + rad).min(self.height as i32);

        for y in y_min..y_max {
            for x in x_min..x_max {
                let cursor = FieldCursor {
                    field: &mut self.field,
                    x: x as u32,
                    y: y as u32,
                    width: self.width,
                    height: self.height,
                };
                brush.stamp((px - x) as f32, (py - y) as f32, cursor, remove);
            }
        }
    }
}

fn empty_field(size: usize, rng: &mut SmallRng) -> FieldBuffer {
    let data = (0..size)
        .map(|_| PointData::new(0.0, rng.r#gen::<f32>()))
        .collect();
    FieldBuffer::new(data)
}

fn sample_point(point: PointData, thresh: f32, rng: &mut SmallRng) -> u8 {
    if (point.thresh_band - thresh).abs() < OUTLINE_BAND {
        return category::OUTLINE;
    }

    if point.thresh_band > thresh {
        if point.color_band < rng.r#gen::<f32>() {
            category::FILL_A
        } else {
            category::FILL_B
        }
    } else {
        category::BACKGROUND
    }
}

impl SimulationEngine for BlobCanvas {
    type Brush = BlobBrush;

    fn create_brush(&self, kind: ToolKind) -> BlobBrush {
        match kind {
            ToolKind::Brush => BlobBrush::paintbrush(32.0, 6.0, 1.25),
            ToolKind::Outliner => BlobBrush::outliner(24.0),
            ToolKind::Smudger => BlobBrush::smudger(24.0),
            ToolKind::Colorer => BlobBrush::colorer(24.0),
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tick(&mut self, micros: u32) {
        self.t += u64::from(micros);
        self.field.flush();
    }

    fn apply_brush(&mut self, x: f32, y: f32, brush: &BlobBrush) {
        self.stamp(x, y, brush, false);
    }

    fn remove_brush(&mut self, x: f32, y: f32, brush: &BlobBrush) {
        self.stamp(x, y, brush, true);
    }

    fn push_undo(&mut self) {
        self.undo_stack.push_back(self.field.snapshot());
        while self.undo_stack.len() > MAX_UNDOS {
            self.undo_stack.pop_front();
        }
    }

    fn try_pop_undo(&mut self) -> bool {
        match self.undo_stack.pop_back() {
            Some(data) => {
                self.field = FieldBuffer::new(data);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.push_undo();
        self.field = empty_field(self.field.len(), &mut self.rng);
    }

    fn flip_horizontal(&mut self) {
        self.push_undo();
        self.field.mirror_rows(self.width as usize);
    }

    fn draw_buffer_size(&self) -> usize {
        self.draw_buffer.len() / 3
    }

    fn fill_draw_buffer(&mut self) {
        for i in 0..self.draw_buffer_size() {
            let x = self.rng.gen_range(0..self.width);
            let y = self.rng.gen_range(0..self.height);
            let index = self.sample_pixel(x, y);
            // MAX_CANVAS_SIDE keeps both coordinates within a byte
            self.draw_buffer[i * 3] = x as u8;
            self.draw_buffer[i * 3 + 1] = y as u8;
            self.draw_buffer[i * 3 + 2] = index;
        }
    }

    fn draw_buffer(&self) -> &[u8] {
        &self.draw_buffer
    }

    fn sample_pixel(&mut self, x: u32, y: u32) -> u8 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let thresh = self.threshold_at_row(y);
        let point = self.point(x, y);
        sample_point(point, thresh, &mut self.rng)
    }

    fn set_thresh_base(&mut self, value: f32) {
        self.thresh_base = value;
    }

    fn set_thresh_variance(&mut self, value: f32) {
        self.thresh_t_var = value;
    }

    fn set_thresh_time_multiplier(&mut self, value: f32) {
        self.thresh_t_mult = value;
    }

    fn thresh_time_multiplier(&self) -> f32 {
        self.thresh_t_mult
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> BlobCanvas {
        BlobCanvas::new(32, 16).unwrap()
    }

    #[test]
    fn rejects_invalid_dimensions() {
        assert_eq!(
            BlobCanvas::new(0, 10).unwrap_err(),
            EngineError::InvalidDimensions { width: 0, height: 10 }
        );
        assert!(BlobCanvas::new(300, 10).is_err());
        assert!(BlobCanvas::new(256, 256).is_ok());
    }

    #[test]
    fn draw_buffer_is_five_percent_of_canvas() {
        let canvas = BlobCanvas::new(256, 200).unwrap();
        assert_eq!(canvas.draw_buffer_size(), 2560);
        assert_eq!(canvas.draw_buffer().len(), 2560 * 3);
    }

    #[test]
    fn draw_buffer_stays_in_bounds() {
        let mut canvas = canvas();
        canvas.fill_draw_buffer();
        for triple in canvas.draw_buffer().chunks(3) {
            assert!(u32::from(triple[0]) < 32);
            assert!(u32::from(triple[1]) < 16);
            assert!(triple[2] <= category::OUTLINE);
        }
    }

    #[test]
    fn brush_is_visible_only_after_tick() {
        let mut canvas = canvas();
        let brush = canvas.create_brush(ToolKind::Brush);
        canvas.apply_brush(0.5, 0.5, &brush);
        assert_eq!(canvas.point(16, 8).thresh_band, 0.0);

        canvas.tick(16_000);
        assert!(canvas.point(16, 8).thresh_band > 0.9);
        assert_eq!(canvas.elapsed_micros(), 16_000);
    }

    #[test]
    fn remove_brush_reverts_paint() {
        let mut canvas = canvas();
        let brush = canvas.create_brush(ToolKind::Brush);
        canvas.apply_brush(0.5, 0.5, &brush);
        canvas.remove_brush(0.5, 0.5, &brush);
        canvas.tick(0);
        assert!(canvas.point(16, 8).thresh_band < 0.1);
    }

    #[test]
    fn undo_restores_checkpoint() {
        let mut canvas = canvas();
        let brush = canvas.create_brush(ToolKind::Brush);
        canvas.push_undo();
        canvas.apply_brush(0.5, 0.5, &brush);
        canvas.tick(0);

        assert!(canvas.try_pop_undo());
        assert_eq!(canvas.point(16, 8).thresh_band, 0.0);
        assert!(!canvas.try_pop_undo());
    }

    #[test]
    fn undo_history_is_bounded() {
        let mut canvas = canvas();
        for _ in 0..20 {
            canvas.push_undo();
        }
        assert_eq!(canvas.undo_depth(), MAX_UNDOS);
    }

    #[test]
    fn clear_and_flip_are_undoable() {
        let mut canvas = canvas();
        canvas.clear();
        canvas.flip_horizontal();
        assert_eq!(canvas.undo_depth(), 2);
    }

    #[test]
    fn outline_band_samples_outline_category() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sample_point(PointData::new(0.41, 0.5), 0.4, &mut rng), category::OUTLINE);
        assert_eq!(sample_point(PointData::new(0.0, 0.5), 0.4, &mut rng), category::BACKGROUND);
        assert_eq!(sample_point(PointData::new(0.9, 1.0), 0.4, &mut rng), category::FILL_B);
    }
}
