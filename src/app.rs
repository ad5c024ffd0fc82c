use std::cell::RefCell;
use std::rc::Rc;

use egui::{Event, PointerButton, Rect, TouchPhase};

use crate::capture::{ArtifactStore, CaptureCallbacks, GifEncoderFactory};
use crate::config::PaintConfig;
use crate::driver::{FrameScheduler, PaintLoop, SystemClock, ThresholdSettings};
use crate::engine::BlobCanvas;
use crate::error::PaintResult;
use crate::input::{DeviceEvent, PRIMARY_BUTTON_BIT, SECONDARY_BUTTON_BIT};
use crate::palette::PaletteBook;
use crate::panels::{central_panel, tools_panel};
use crate::renderer::{InteractiveTab, RenderStrategy};
use crate::tools::ToolboxSettings;

/// UI state restored between sessions. The artwork itself is not persisted.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct AppSettings {
    pub tools: ToolboxSettings,
    pub palette: usize,
    pub thresholds: ThresholdSettings,
    pub tab: InteractiveTab,
    pub strategy: RenderStrategy,
}

/// What the Export tab shows, written by the capture callbacks
#[derive(Debug, Default, Clone)]
pub struct ExportStatus {
    pub progress: String,
    /// Set once a session ended and can be reset
    pub can_reset: bool,
    pub link: Option<String>,
}

struct RepaintScheduler<'a>(&'a egui::Context);

impl FrameScheduler for RepaintScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_repaint();
    }
}

pub struct PaintApp {
    paint: PaintLoop<BlobCanvas>,
    texture: Option<egui::TextureHandle>,
    export: Rc<RefCell<ExportStatus>>,
    canvas_rect: Option<Rect>,
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, config: PaintConfig) -> PaintResult<Self> {
        let settings: AppSettings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        Self::with_settings(config, settings)
    }

    pub fn with_settings(config: PaintConfig, settings: AppSettings) -> PaintResult<Self> {
        let engine = BlobCanvas::new(config.canvas_width, config.canvas_height)?;
        let mut paint = PaintLoop::new(
            engine,
            &config,
            Box::new(GifEncoderFactory),
            artifact_store(),
        );

        for kind in crate::engine::ToolKind::ALL {
            paint
                .tools_mut()
                .apply_settings(kind, settings.tools.get(kind).clone());
        }
        paint.tools_mut().select(settings.tools.active);
        *paint.palettes_mut() = PaletteBook::new(settings.palette);
        paint.set_thresholds(settings.thresholds);
        paint.set_tab(settings.tab);
        paint.renderer_mut().set_strategy(settings.strategy);

        Ok(Self {
            paint,
            texture: None,
            export: Rc::new(RefCell::new(ExportStatus::default())),
            canvas_rect: None,
        })
    }

    pub fn paint(&self) -> &PaintLoop<BlobCanvas> {
        &self.paint
    }

    pub fn paint_mut(&mut self) -> &mut PaintLoop<BlobCanvas> {
        &mut self.paint
    }

    pub fn settings(&self) -> AppSettings {
        AppSettings {
            tools: self.paint.tools().settings().clone(),
            palette: self.paint.palettes().index(),
            thresholds: self.paint.thresholds(),
            tab: self.paint.tab(),
            strategy: self.paint.renderer().strategy(),
        }
    }

    pub fn export_status(&self) -> ExportStatus {
        self.export.borrow().clone()
    }

    pub fn start_capture(&mut self) -> bool {
        let progress = Rc::clone(&self.export);
        let reset = Rc::clone(&self.export);
        let link = Rc::clone(&self.export);
        {
            let mut status = self.export.borrow_mut();
            status.can_reset = false;
            status.link = None;
        }
        self.paint.start_capture(CaptureCallbacks::new(
            move |text| progress.borrow_mut().progress = text.to_owned(),
            move |enabled| reset.borrow_mut().can_reset = enabled,
            move |url| link.borrow_mut().link = Some(url.to_owned()),
        ))
    }

    pub fn reset_capture(&mut self) {
        self.paint.reset_capture();
        *self.export.borrow_mut() = ExportStatus::default();
    }

    /// Record where the canvas is drawn this frame
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = Some(rect);
        self.paint.set_canvas_rect(Some(rect));
    }

    /// Translate this frame's egui input into device events for the loop
    pub fn handle_input(&mut self, ctx: &egui::Context) {
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z)) {
            self.paint.undo();
        }

        let canvas = self.canvas_rect;
        let events = ctx.input(|i| device_events(&i.events, i.any_touches(), canvas));
        for event in &events {
            self.paint.handle_event(event);
        }
    }

    /// Run one loop cycle and upload the result
    pub fn run_cycle(&mut self, ctx: &egui::Context) -> &egui::TextureHandle {
        self.paint
            .step(&SystemClock, &mut RepaintScheduler(ctx));

        let image = self.paint.raster().to_color_image();
        let texture = match self.texture.take() {
            Some(mut texture) => {
                texture.set(image, egui::TextureOptions::NEAREST);
                texture
            }
            None => ctx.load_texture("canvas", image, egui::TextureOptions::NEAREST),
        };
        self.texture.insert(texture)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn artifact_store() -> Box<dyn ArtifactStore> {
    Box::new(crate::capture::FileArtifactStore::new(
        std::env::temp_dir().join("blob_paint"),
    ))
}

#[cfg(target_arch = "wasm32")]
fn artifact_store() -> Box<dyn ArtifactStore> {
    Box::new(crate::capture::MemoryArtifactStore::new())
}

/// Map egui events onto device events. Strokes only begin inside `canvas` but
/// may end anywhere; emulated pointer events are dropped while touching.
pub fn device_events(events: &[Event], touching: bool, canvas: Option<Rect>) -> Vec<DeviceEvent> {
    let on_canvas = |pos: egui::Pos2| canvas.is_some_and(|rect| rect.contains(pos));
    let mut out = Vec::new();

    for event in events {
        match event {
            Event::PointerMoved(position) if !touching => {
                out.push(DeviceEvent::PointerMove {
                    position: *position,
                });
            }
            Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } if !touching => {
                let buttons = match button {
                    PointerButton::Primary => PRIMARY_BUTTON_BIT,
                    PointerButton::Secondary => SECONDARY_BUTTON_BIT,
                    _ => continue,
                };
                if !pressed {
                    out.push(DeviceEvent::PointerUp { position: *pos });
                } else if on_canvas(*pos) {
                    out.push(DeviceEvent::PointerDown {
                        position: *pos,
                        buttons,
                    });
                }
            }
            Event::Touch { phase, pos, .. } => match phase {
                TouchPhase::Start if on_canvas(*pos) => {
                    out.push(DeviceEvent::TouchStart { touches: vec![*pos] });
                }
                TouchPhase::Move => out.push(DeviceEvent::TouchMove { touches: vec![*pos] }),
                TouchPhase::End | TouchPhase::Cancel => out.push(DeviceEvent::TouchEnd),
                _ => {}
            },
            _ => {}
        }
    }
    out
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings());
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        tools_panel(self, ctx);
        central_panel(self, ctx);
    }
}
