//! Boundary to the simulation engine that owns the canvas field.
//!
//! The paint loop only talks to the engine through [`SimulationEngine`] and to
//! engine-side brushes through [`BrushHandle`], so any field simulation can be
//! plugged in. [`blob::BlobCanvas`] is the bundled implementation.

use serde::{Deserialize, Serialize};

pub mod blob;

pub use blob::{BlobBrush, BlobCanvas};

/// The four brush variants an engine has to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Brush,
    Outliner,
    Smudger,
    Colorer,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Brush,
        ToolKind::Outliner,
        ToolKind::Smudger,
        ToolKind::Colorer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Brush => "Brush",
            ToolKind::Outliner => "Outliner",
            ToolKind::Smudger => "Smudger",
            ToolKind::Colorer => "Colorer",
        }
    }
}

/// Engine-side brush instance. Setters a variant has no use for are ignored.
pub trait BrushHandle {
    fn kind(&self) -> ToolKind;

    fn set_size(&mut self, size: f32);

    fn set_curve(&mut self, curve: f32);

    fn set_strength(&mut self, strength: f32);

    fn set_color(&mut self, color: f32);

    fn set_outliner_height(&mut self, height: f32);

    /// Direction the brush drags the field in, for velocity-sensitive variants
    fn set_velocity(&mut self, dx: f32, dy: f32);

    fn supports_velocity(&self) -> bool {
        false
    }

    /// Falloff value at `dist` pixels from the brush centre
    fn sample(&self, dist: f32) -> f32;
}

/// Operations the paint loop needs from the simulation.
pub trait SimulationEngine {
    type Brush: BrushHandle;

    fn create_brush(&self, kind: ToolKind) -> Self::Brush;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Advance simulated time by `micros` time units
    fn tick(&mut self, micros: u32);

    /// Apply the brush at unit-square coordinates
    fn apply_brush(&mut self, x: f32, y: f32, brush: &Self::Brush);

    /// Inverse of [`SimulationEngine::apply_brush`]
    fn remove_brush(&mut self, x: f32, y: f32, brush: &Self::Brush);

    fn push_undo(&mut self);

    /// Restore the last checkpoint. Returns `false` when there is none.
    fn try_pop_undo(&mut self) -> bool;

    fn clear(&mut self);

    fn flip_horizontal(&mut self);

    /// Number of `(x, y, palette index)` triples in the draw buffer
    fn draw_buffer_size(&self) -> usize;

    fn fill_draw_buffer(&mut self);

    /// Flat `x, y, index` bytes, `draw_buffer_size() * 3` long
    fn draw_buffer(&self) -> &[u8];

    /// Palette index of a single pixel
    fn sample_pixel(&mut self, x: u32, y: u32) -> u8;

    fn set_thresh_base(&mut self, value: f32);

    fn set_thresh_variance(&mut self, value: f32);

    fn set_thresh_time_multiplier(&mut self, value: f32);

    fn thresh_time_multiplier(&self) -> f32;
}
