use egui::Pos2;

/// Which operation a stroke performs, latched when the stroke starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeButton {
    #[default]
    Primary,
    Secondary,
}

/// Pointer as seen by the paint loop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Unit-square canvas coordinates; `None` until the first usable event.
    /// Values outside `[0, 1]` mean the pointer is off the canvas.
    pub position: Option<Pos2>,
    /// True between stroke start and stroke end
    pub active: bool,
    pub button: StrokeButton,
}

impl PointerState {
    /// Last known position, if it lies on the canvas
    pub fn canvas_position(&self) -> Option<Pos2> {
        self.position.filter(|pos| {
            (0.0..=1.0).contains(&pos.x) && (0.0..=1.0).contains(&pos.y)
        })
    }

    pub fn is_on_canvas(&self) -> bool {
        self.canvas_position().is_some()
    }
}
