use serde::{Deserialize, Serialize};

use crate::engine::{BrushHandle, SimulationEngine, ToolKind};

mod dispatch;
pub use dispatch::{DispatchOutcome, dispatch_brush};

/// User-facing parameters of one tool. Fields a tool has no use for are kept
/// but ignored by the engine handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub size: f32,
    pub curve: f32,
    pub strength: f32,
    /// Target colour band, 0 to 1
    pub color: f32,
    /// Outliner ceiling, 0 to 1
    pub height: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::defaults_for(ToolKind::Brush)
    }
}

impl ToolSettings {
    pub fn defaults_for(kind: ToolKind) -> Self {
        let size = match kind {
            ToolKind::Brush => 32.0,
            _ => 24.0,
        };
        Self {
            size,
            curve: 6.0,
            strength: 1.25,
            color: 0.0,
            height: 0.5,
        }
    }

    fn push_to<B: BrushHandle>(&self, handle: &mut B) {
        handle.set_size(self.size);
        handle.set_curve(self.curve);
        handle.set_strength(self.strength);
        handle.set_color(self.color);
        handle.set_outliner_height(self.height);
    }
}

/// Serialisable state of a [`Toolbox`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolboxSettings {
    pub active: ToolKind,
    pub brush: ToolSettings,
    pub outliner: ToolSettings,
    pub smudger: ToolSettings,
    pub colorer: ToolSettings,
}

impl Default for ToolboxSettings {
    fn default() -> Self {
        Self {
            active: ToolKind::Brush,
            brush: ToolSettings::defaults_for(ToolKind::Brush),
            outliner: ToolSettings::defaults_for(ToolKind::Outliner),
            smudger: ToolSettings::defaults_for(ToolKind::Smudger),
            colorer: ToolSettings::defaults_for(ToolKind::Colorer),
        }
    }
}

impl ToolboxSettings {
    pub fn get(&self, kind: ToolKind) -> &ToolSettings {
        match kind {
            ToolKind::Brush => &self.brush,
            ToolKind::Outliner => &self.outliner,
            ToolKind::Smudger => &self.smudger,
            ToolKind::Colorer => &self.colorer,
        }
    }

    fn get_mut(&mut self, kind: ToolKind) -> &mut ToolSettings {
        match kind {
            ToolKind::Brush => &mut self.brush,
            ToolKind::Outliner => &mut self.outliner,
            ToolKind::Smudger => &mut self.smudger,
            ToolKind::Colorer => &mut self.colorer,
        }
    }
}

/// Owns one engine brush per tool and tracks which one is active.
/// Switching tools never resets another tool's parameters.
pub struct Toolbox<B> {
    /// One handle per kind, in `ToolKind::ALL` order
    handles: Vec<B>,
    settings: ToolboxSettings,
}

impl<B: BrushHandle> Toolbox<B> {
    pub fn new<E: SimulationEngine<Brush = B>>(engine: &E) -> Self {
        Self::with_settings(engine, ToolboxSettings::default())
    }

    pub fn with_settings<E: SimulationEngine<Brush = B>>(engine: &E, settings: ToolboxSettings) -> Self {
        let handles = ToolKind::ALL
            .iter()
            .map(|&kind| {
                let mut handle = engine.create_brush(kind);
                settings.get(kind).push_to(&mut handle);
                handle
            })
            .collect();
        Self { handles, settings }
    }

    pub fn active(&self) -> ToolKind {
        self.settings.active
    }

    pub fn select(&mut self, kind: ToolKind) {
        if self.settings.active != kind {
            log::info!("Tool selected: {}", kind.name());
            self.settings.active = kind;
        }
    }

    pub fn handle(&self, kind: ToolKind) -> &B {
        &self.handles[kind as usize]
    }

    pub fn active_handle(&self) -> &B {
        self.handle(self.active())
    }

    pub fn settings(&self) -> &ToolboxSettings {
        &self.settings
    }

    pub fn tool_settings(&self, kind: ToolKind) -> &ToolSettings {
        self.settings.get(kind)
    }

    /// Replace one tool's parameters and push them to its engine handle
    pub fn apply_settings(&mut self, kind: ToolKind, settings: ToolSettings) {
        settings.push_to(self.handle_mut(kind));
        *self.settings.get_mut(kind) = settings;
    }

    pub fn set_size(&mut self, kind: ToolKind, size: f32) {
        self.settings.get_mut(kind).size = size;
        self.handle_mut(kind).set_size(size);
    }

    pub fn set_curve(&mut self, kind: ToolKind, curve: f32) {
        self.settings.get_mut(kind).curve = curve;
        self.handle_mut(kind).set_curve(curve);
    }

    pub fn set_strength(&mut self, kind: ToolKind, strength: f32) {
        self.settings.get_mut(kind).strength = strength;
        self.handle_mut(kind).set_strength(strength);
    }

    pub fn set_color(&mut self, kind: ToolKind, color: f32) {
        self.settings.get_mut(kind).color = color;
        self.handle_mut(kind).set_color(color);
    }

    pub fn set_outliner_height(&mut self, height: f32) {
        self.settings.get_mut(ToolKind::Outliner).height = height;
        self.handle_mut(ToolKind::Outliner).set_outliner_height(height);
    }

    /// Forward a drag direction to the active tool if it uses one
    pub fn set_velocity(&mut self, dx: f32, dy: f32) {
        let kind = self.active();
        let handle = self.handle_mut(kind);
        if handle.supports_velocity() {
            handle.set_velocity(dx, dy);
        }
    }

    /// Falloff of the active tool, for the curve graph
    pub fn sample(&self, dist: f32) -> f32 {
        self.active_handle().sample(dist)
    }

    fn handle_mut(&mut self, kind: ToolKind) -> &mut B {
        &mut self.handles[kind as usize]
    }
}
