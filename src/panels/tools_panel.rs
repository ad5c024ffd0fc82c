use egui::{Color32, Slider, Ui};

use crate::PaintApp;
use crate::components::ToolButton;
use crate::engine::ToolKind;
use crate::renderer::{InteractiveTab, RenderStrategy};
use crate::widgets::BrushGraph;

pub fn tools_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Blob Paint");

            let mut tab = app.paint().tab();
            ui.horizontal(|ui| {
                ui.selectable_value(&mut tab, InteractiveTab::Draw, "Draw");
                ui.selectable_value(&mut tab, InteractiveTab::Palette, "Palette");
                ui.selectable_value(&mut tab, InteractiveTab::Export, "Export");
            });
            if tab != app.paint().tab() {
                app.paint_mut().set_tab(tab);
            }
            ui.separator();

            match tab {
                InteractiveTab::Draw => draw_tab(app, ui),
                InteractiveTab::Palette => palette_tab(app, ui),
                InteractiveTab::Export => export_tab(app, ui),
            }
        });
}

fn draw_tab(app: &mut PaintApp, ui: &mut Ui) {
    let active = app.paint().tools().active();
    ui.horizontal(|ui| {
        for kind in ToolKind::ALL {
            if ToolButton::new(kind, kind == active).show(ui).clicked() {
                app.paint_mut().tools_mut().select(kind);
            }
        }
    });

    let kind = app.paint().tools().active();
    let mut settings = app.paint().tools().tool_settings(kind).clone();
    let mut changed = ui
        .add(Slider::new(&mut settings.size, 2.0..=96.0).text("Size"))
        .changed();
    match kind {
        ToolKind::Brush => {
            changed |= ui
                .add(Slider::new(&mut settings.curve, 0.0..=20.0).text("Curve"))
                .changed();
            changed |= ui
                .add(Slider::new(&mut settings.strength, 0.0..=4.0).text("Strength"))
                .changed();
            changed |= ui
                .add(Slider::new(&mut settings.color, 0.0..=1.0).text("Colour"))
                .changed();
        }
        ToolKind::Outliner => {
            changed |= ui
                .add(Slider::new(&mut settings.height, 0.0..=1.0).text("Height"))
                .changed();
        }
        ToolKind::Colorer => {
            changed |= ui
                .add(Slider::new(&mut settings.color, 0.0..=1.0).text("Colour"))
                .changed();
        }
        ToolKind::Smudger => {}
    }
    if changed {
        app.paint_mut().tools_mut().apply_settings(kind, settings.clone());
    }

    if kind == ToolKind::Brush {
        ui.add(BrushGraph::new(app.paint().tools(), settings.size / 2.0));
    }

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Undo").on_hover_text("Ctrl+Z").clicked() {
            app.paint_mut().undo();
        }
        if ui.button("Clear").clicked() {
            app.paint_mut().clear();
        }
        if ui.button("Flip").clicked() {
            app.paint_mut().flip();
        }
    });

    let mut noisy = app.paint().renderer().strategy() == RenderStrategy::Stochastic;
    if ui.checkbox(&mut noisy, "Noisy redraw").changed() {
        let strategy = if noisy {
            RenderStrategy::Stochastic
        } else {
            RenderStrategy::DrawBuffer
        };
        app.paint_mut().renderer_mut().set_strategy(strategy);
    }
}

fn palette_tab(app: &mut PaintApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if ui.button("◀").clicked() {
            app.paint_mut().palettes_mut().prev();
        }
        ui.label(app.paint().palettes().active().name);
        if ui.button("▶").clicked() {
            app.paint_mut().palettes_mut().next();
        }
    });
    ui.horizontal(|ui| {
        for color in app.paint().palettes().active_colors() {
            swatch(ui, color);
        }
    });

    ui.separator();
    let mut thresholds = app.paint().thresholds();
    // Slider works in radians per second of simulated time
    let mut speed = thresholds.time_multiplier * 1e6;
    let mut changed = ui
        .add(Slider::new(&mut thresholds.base, 0.0..=1.0).text("Threshold"))
        .changed();
    changed |= ui
        .add(Slider::new(&mut thresholds.variance, 0.0..=0.5).text("Variance"))
        .changed();
    changed |= ui
        .add(Slider::new(&mut speed, 0.0..=20.0).text("Speed"))
        .changed();
    if changed {
        thresholds.time_multiplier = speed / 1e6;
        app.paint_mut().set_thresholds(thresholds);
    }
}

fn export_tab(app: &mut PaintApp, ui: &mut Ui) {
    let capture = app.paint().capture();
    let busy = capture.is_active();
    let frames = capture.frames_added();
    let target = capture.target_frame_count();
    let status = app.export_status();

    if ui.add_enabled(!busy, egui::Button::new("Capture GIF")).clicked() {
        app.start_capture();
    }

    if !status.progress.is_empty() {
        ui.label(&status.progress);
    }
    if let Some(target) = target.filter(|_| busy) {
        ui.label(format!("{frames} / {} frames", target.saturating_add(1)));
    }

    if let Some(link) = &status.link {
        if link.starts_with("memory://") {
            ui.label(link);
        } else {
            ui.hyperlink_to("Open capture", format!("file://{link}"));
        }
    }

    if ui
        .add_enabled(status.can_reset, egui::Button::new("Reset"))
        .clicked()
    {
        app.reset_capture();
    }
}

fn swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(24.0, 24.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
}
