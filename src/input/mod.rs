use egui::{Pos2, Rect};

pub mod smoothing;
mod state;

pub use smoothing::VelocitySmoother;
pub use state::{PointerState, StrokeButton};

/// Bit set in `buttons` while the primary (left) button is held
pub const PRIMARY_BUTTON_BIT: u16 = 0x1;
/// Bit set in `buttons` while the secondary (right) button is held
pub const SECONDARY_BUTTON_BIT: u16 = 0x2;

/// Raw device input in client (screen) coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    PointerMove {
        position: Pos2,
    },
    PointerDown {
        position: Pos2,
        /// Bitmask of every button held, see [`SECONDARY_BUTTON_BIT`]
        buttons: u16,
    },
    PointerUp {
        position: Pos2,
    },
    /// Touch points currently on the surface, first one drives the pointer
    TouchStart {
        touches: Vec<Pos2>,
    },
    TouchMove {
        touches: Vec<Pos2>,
    },
    TouchEnd,
}

/// Leading and trailing edge of a stroke, reported by [`PointerTracker::handle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeEdge {
    Began,
    Ended,
}

/// Turns device events into a [`PointerState`] in unit canvas coordinates
#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
    canvas_rect: Option<Rect>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the canvas rectangle, `None` while the canvas is not laid out
    pub fn set_canvas_rect(&mut self, rect: Option<Rect>) {
        self.canvas_rect = rect;
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Map client coordinates into the unit square. No clamping: points off the
    /// canvas land outside `[0, 1]`.
    pub fn normalize(&self, client: Pos2) -> Option<Pos2> {
        let rect = self.canvas_rect?;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        Some(Pos2::new(
            (client.x - rect.min.x) / rect.width(),
            (client.y - rect.min.y) / rect.height(),
        ))
    }

    /// Apply one event. Returns the stroke edge it produced, if any.
    pub fn handle(&mut self, event: &DeviceEvent) -> Option<StrokeEdge> {
        match event {
            DeviceEvent::PointerMove { position } => {
                self.track(*position);
                None
            }
            DeviceEvent::PointerDown { position, buttons } => {
                self.track(*position);
                let button = if buttons & SECONDARY_BUTTON_BIT != 0 {
                    StrokeButton::Secondary
                } else {
                    StrokeButton::Primary
                };
                self.begin(button)
            }
            DeviceEvent::PointerUp { .. } | DeviceEvent::TouchEnd => self.end(),
            DeviceEvent::TouchStart { touches } => {
                if let Some(first) = touches.first() {
                    self.track(*first);
                }
                self.begin(StrokeButton::Primary)
            }
            DeviceEvent::TouchMove { touches } => {
                if let Some(first) = touches.first() {
                    self.track(*first);
                }
                None
            }
        }
    }

    fn track(&mut self, client: Pos2) {
        match self.normalize(client) {
            Some(pos) => self.state.position = Some(pos),
            None => log::trace!("No canvas rect yet, skipping pointer update"),
        }
    }

    fn begin(&mut self, button: StrokeButton) -> Option<StrokeEdge> {
        if self.state.active {
            return None;
        }
        self.state.active = true;
        self.state.button = button;
        Some(StrokeEdge::Began)
    }

    fn end(&mut self) -> Option<StrokeEdge> {
        if !self.state.active {
            return None;
        }
        self.state.active = false;
        Some(StrokeEdge::Ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn tracker() -> PointerTracker {
        let mut tracker = PointerTracker::new();
        tracker.set_canvas_rect(Some(Rect::from_min_size(pos2(100.0, 50.0), egui::vec2(200.0, 100.0))));
        tracker
    }

    #[test]
    fn normalizes_relative_to_rect_origin() {
        let mut tracker = tracker();
        tracker.handle(&DeviceEvent::PointerMove { position: pos2(200.0, 75.0) });
        assert_eq!(tracker.state().position, Some(pos2(0.5, 0.25)));
    }

    #[test]
    fn does_not_clamp_outside_points() {
        let mut tracker = tracker();
        tracker.handle(&DeviceEvent::PointerMove { position: pos2(50.0, 250.0) });
        assert_eq!(tracker.state().position, Some(pos2(-0.25, 2.0)));
        assert!(!tracker.state().is_on_canvas());
    }

    #[test]
    fn missing_rect_skips_update() {
        let mut tracker = PointerTracker::new();
        tracker.handle(&DeviceEvent::PointerMove { position: pos2(10.0, 10.0) });
        assert_eq!(tracker.state().position, None);

        // A stroke may still start before layout
        let edge = tracker.handle(&DeviceEvent::PointerDown { position: pos2(10.0, 10.0), buttons: 1 });
        assert_eq!(edge, Some(StrokeEdge::Began));
    }

    #[test]
    fn held_pointer_starts_one_stroke() {
        let mut tracker = tracker();
        let down = DeviceEvent::PointerDown { position: pos2(150.0, 60.0), buttons: PRIMARY_BUTTON_BIT };
        assert_eq!(tracker.handle(&down), Some(StrokeEdge::Began));
        assert_eq!(tracker.handle(&down), None);
        assert_eq!(tracker.handle(&DeviceEvent::PointerUp { position: pos2(0.0, 0.0) }), Some(StrokeEdge::Ended));
        assert_eq!(tracker.handle(&DeviceEvent::PointerUp { position: pos2(0.0, 0.0) }), None);
    }

    #[test]
    fn button_is_latched_at_stroke_start() {
        let mut tracker = tracker();
        tracker.handle(&DeviceEvent::PointerDown {
            position: pos2(150.0, 60.0),
            buttons: SECONDARY_BUTTON_BIT,
        });
        assert_eq!(tracker.state().button, StrokeButton::Secondary);

        // Pressing primary mid-drag does not flip the operation
        tracker.handle(&DeviceEvent::PointerDown {
            position: pos2(150.0, 60.0),
            buttons: PRIMARY_BUTTON_BIT | SECONDARY_BUTTON_BIT,
        });
        assert_eq!(tracker.state().button, StrokeButton::Secondary);
    }

    #[test]
    fn touch_uses_first_point() {
        let mut tracker = tracker();
        let edge = tracker.handle(&DeviceEvent::TouchStart {
            touches: vec![pos2(300.0, 150.0), pos2(100.0, 50.0)],
        });
        assert_eq!(edge, Some(StrokeEdge::Began));
        assert_eq!(tracker.state().position, Some(pos2(1.0, 1.0)));
        assert_eq!(tracker.state().button, StrokeButton::Primary);

        tracker.handle(&DeviceEvent::TouchMove { touches: vec![pos2(100.0, 50.0)] });
        assert_eq!(tracker.state().position, Some(pos2(0.0, 0.0)));
        assert_eq!(tracker.handle(&DeviceEvent::TouchEnd), Some(StrokeEdge::Ended));
    }
}
