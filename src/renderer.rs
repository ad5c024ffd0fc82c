// src/renderer.rs
use egui::{Color32, Pos2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::engine::SimulationEngine;
use crate::palette::PALETTE_SIZE;

/// How the engine's field is turned into pixels each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderStrategy {
    /// Paint the engine's draw buffer of `(x, y, index)` triples
    #[default]
    DrawBuffer,
    /// Resample random pixels straight from the engine
    Stochastic,
}

/// Side panel tab, the frame-rate readout is only shown while drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractiveTab {
    #[default]
    Draw,
    Palette,
    Export,
}

/// 2-D target the renderer paints into
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Fill a block, clipped to the surface
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Color32);

    fn fill_text(&mut self, text: &str, position: Pos2, color: Color32);

    /// Called before each frame is drawn
    fn begin_frame(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub position: Pos2,
    pub color: Color32,
}

/// CPU pixel surface. Pixels persist across frames; text is kept as an
/// overlay for the host to paint on top and is not part of the pixels.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Color32>,
    overlay: Option<TextOverlay>,
}

impl Raster {
    pub fn new(width: u32, height: u32, fill: Color32) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; (width * height) as usize],
            overlay: None,
        }
    }

    pub fn pixels(&self) -> &[Color32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn overlay(&self) -> Option<&TextOverlay> {
        self.overlay.as_ref()
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        let mut image = egui::ColorImage::new(self.size(), Color32::BLACK);
        image.pixels.copy_from_slice(&self.pixels);
        image
    }

    /// Unmultiplied RGBA bytes, row major
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_array()).collect()
    }
}

impl Surface for Raster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Color32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y..y_end {
            let row = (py * self.width) as usize;
            self.pixels[row + x as usize..row + x_end as usize].fill(color);
        }
    }

    fn fill_text(&mut self, text: &str, position: Pos2, color: Color32) {
        self.overlay = Some(TextOverlay {
            text: text.to_owned(),
            position,
            color,
        });
    }

    fn begin_frame(&mut self) {
        self.overlay = None;
    }
}

/// Paints the engine's field into a [`Surface`]. The surface is never cleared;
/// both strategies rely on the simulation revisiting changed pixels.
#[derive(Debug)]
pub struct Renderer {
    strategy: RenderStrategy,
    block_size: u32,
    sample_probability: f32,
    rng: SmallRng,
}

impl Renderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            strategy: config.strategy,
            block_size: config.block_size,
            sample_probability: config.sample_probability,
            rng: SmallRng::seed_from_u64(0x5eed),
        }
    }

    pub fn strategy(&self) -> RenderStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: RenderStrategy) {
        self.strategy = strategy;
    }

    /// Draw one frame, with the frame-rate readout when `fps_overlay` is set
    pub fn render<E, S>(
        &mut self,
        engine: &mut E,
        colors: &[Color32; PALETTE_SIZE],
        surface: &mut S,
        fps_overlay: Option<f64>,
    ) where
        E: SimulationEngine,
        S: Surface,
    {
        surface.begin_frame();

        match self.strategy {
            RenderStrategy::DrawBuffer => self.render_draw_buffer(engine, colors, surface),
            RenderStrategy::Stochastic => self.render_sampled(engine, colors, surface),
        }

        if let Some(fps) = fps_overlay {
            surface.fill_text(&format!("{}", fps.floor()), Pos2::new(10.0, 10.0), Color32::BLACK);
        }
    }

    fn render_draw_buffer<E: SimulationEngine, S: Surface>(
        &self,
        engine: &mut E,
        colors: &[Color32; PALETTE_SIZE],
        surface: &mut S,
    ) {
        engine.fill_draw_buffer();
        let len = engine.draw_buffer_size() * 3;
        let buffer = engine.draw_buffer();
        let (width, height) = (surface.width(), surface.height());

        for triple in buffer[..len.min(buffer.len())].chunks_exact(3) {
            let (x, y) = (u32::from(triple[0]), u32::from(triple[1]));
            if x >= width || y >= height {
                continue;
            }
            if let Some(&color) = colors.get(triple[2] as usize) {
                surface.fill_rect(x, y, self.block_size, self.block_size, color);
            }
        }
    }

    /// Redraws roughly `sample_probability` of the pixels; never the full frame.
    fn render_sampled<E: SimulationEngine, S: Surface>(
        &mut self,
        engine: &mut E,
        colors: &[Color32; PALETTE_SIZE],
        surface: &mut S,
    ) {
        let width = surface.width().min(engine.width());
        let height = surface.height().min(engine.height());

        for y in 0..height {
            for x in 0..width {
                if self.rng.r#gen::<f32>() >= self.sample_probability {
                    continue;
                }
                let index = engine.sample_pixel(x, y);
                if let Some(&color) = colors.get(index as usize) {
                    surface.fill_rect(x, y, self.block_size, self.block_size, color);
                }
            }
        }
    }
}
