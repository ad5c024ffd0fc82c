use egui::{Align2, Color32, FontId, Rect, Sense, pos2, vec2};

use crate::PaintApp;

/// Canvas area: lays out the canvas, feeds input, runs the cycle and paints
/// the result with its text overlay.
pub fn central_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let [width, height] = app.paint().raster().size();
        let available = ui.available_size();
        let fit = (available.x / width as f32).min(available.y / height as f32);
        // Whole-number zoom keeps the 2x2 blocks crisp
        let scale = if fit >= 1.0 { fit.floor() } else { fit.max(0.1) };

        let size = vec2(width as f32, height as f32) * scale;
        let (rect, _response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        app.set_canvas_rect(rect);
        app.handle_input(ctx);

        let texture_id = app.run_cycle(ctx).id();
        let painter = ui.painter_at(rect);
        painter.image(
            texture_id,
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        if let Some(overlay) = app.paint().raster().overlay() {
            painter.text(
                rect.min + overlay.position.to_vec2() * scale,
                Align2::LEFT_TOP,
                &overlay.text,
                FontId::monospace(10.0 * scale.max(1.0)),
                overlay.color,
            );
        }
    });
}
