use egui::{Color32, Pos2, Response, Sense, Shape, Stroke, Ui, Vec2, Widget};

use crate::engine::BrushHandle;
use crate::tools::Toolbox;

/// Falloff of the active tool from its centre out to `radius`, sampled at
/// `samples + 1` points and scaled so the peak is 1.
pub fn falloff_curve<B: BrushHandle>(tools: &Toolbox<B>, radius: f32, samples: usize) -> Vec<f32> {
    let samples = samples.max(1);
    let raw: Vec<f32> = (0..=samples)
        .map(|i| tools.sample(radius * i as f32 / samples as f32))
        .collect();
    let peak = raw.iter().copied().fold(0.0_f32, f32::max);
    if peak <= f32::EPSILON {
        return vec![0.0; raw.len()];
    }
    raw.into_iter().map(|v| (v / peak).clamp(0.0, 1.0)).collect()
}

/// Line graph of the active tool's falloff
pub struct BrushGraph<'a, B> {
    tools: &'a Toolbox<B>,
    radius: f32,
    size: Vec2,
}

impl<'a, B: BrushHandle> BrushGraph<'a, B> {
    pub fn new(tools: &'a Toolbox<B>, radius: f32) -> Self {
        Self {
            tools,
            radius,
            size: Vec2::new(180.0, 60.0),
        }
    }
}

impl<B: BrushHandle> Widget for BrushGraph<'_, B> {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(self.size, Sense::hover());
        if !ui.is_rect_visible(rect) {
            return response;
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 2.0, Color32::from_gray(24));

        let curve = falloff_curve(self.tools, self.radius, 48);
        let last = (curve.len() - 1).max(1) as f32;
        let points: Vec<Pos2> = curve
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Pos2::new(
                    rect.left() + rect.width() * i as f32 / last,
                    rect.bottom() - rect.height() * v,
                )
            })
            .collect();
        painter.add(Shape::line(points, Stroke::new(1.5, Color32::from_rgb(100, 181, 246))));

        response
    }
}
