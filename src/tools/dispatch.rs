use crate::engine::SimulationEngine;
use crate::input::{PointerState, StrokeButton};

use super::Toolbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Removed,
    /// No stroke, or the pointer is off the canvas
    Skipped,
}

/// Apply or remove the active tool at the pointer, once per cycle.
/// Off-canvas positions are skipped rather than clamped to the border.
pub fn dispatch_brush<E: SimulationEngine>(
    engine: &mut E,
    pointer: &PointerState,
    tools: &Toolbox<E::Brush>,
) -> DispatchOutcome {
    if !pointer.active {
        return DispatchOutcome::Skipped;
    }
    let Some(pos) = pointer.canvas_position() else {
        return DispatchOutcome::Skipped;
    };

    let brush = tools.active_handle();
    match pointer.button {
        StrokeButton::Primary => {
            engine.apply_brush(pos.x, pos.y, brush);
            DispatchOutcome::Applied
        }
        StrokeButton::Secondary => {
            engine.remove_brush(pos.x, pos.y, brush);
            DispatchOutcome::Removed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BlobCanvas;
    use egui::pos2;

    fn setup() -> (BlobCanvas, Toolbox<crate::engine::BlobBrush>) {
        let engine = BlobCanvas::new(16, 16).unwrap();
        let tools = Toolbox::new(&engine);
        (engine, tools)
    }

    #[test]
    fn inactive_pointer_is_skipped() {
        let (mut engine, tools) = setup();
        let pointer = PointerState {
            position: Some(pos2(0.5, 0.5)),
            active: false,
            button: StrokeButton::Primary,
        };
        assert_eq!(dispatch_brush(&mut engine, &pointer, &tools), DispatchOutcome::Skipped);
    }

    #[test]
    fn off_canvas_is_skipped() {
        let (mut engine, tools) = setup();
        let pointer = PointerState {
            position: Some(pos2(1.2, 0.5)),
            active: true,
            button: StrokeButton::Primary,
        };
        assert_eq!(dispatch_brush(&mut engine, &pointer, &tools), DispatchOutcome::Skipped);
    }

    #[test]
    fn button_selects_operation() {
        let (mut engine, tools) = setup();
        let mut pointer = PointerState {
            position: Some(pos2(0.5, 0.5)),
            active: true,
            button: StrokeButton::Primary,
        };
        assert_eq!(dispatch_brush(&mut engine, &pointer, &tools), DispatchOutcome::Applied);

        pointer.button = StrokeButton::Secondary;
        assert_eq!(dispatch_brush(&mut engine, &pointer, &tools), DispatchOutcome::Removed);
    }
}
