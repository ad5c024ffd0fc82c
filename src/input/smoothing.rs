use egui::{Pos2, Vec2};

/// Exponentially smoothed pointer position, used to derive a drag direction
/// for velocity-sensitive tools.
#[derive(Debug, Clone)]
pub struct VelocitySmoother {
    k: f32,
    mult: f32,
    /// `None` until the first sample seeds it
    smooth: Option<Pos2>,
    /// Smoothed position before the latest sample
    prev: Option<Pos2>,
}

impl VelocitySmoother {
    pub fn new(k: f32, mult: f32) -> Self {
        Self {
            k,
            mult,
            smooth: None,
            prev: None,
        }
    }

    pub fn smoothed(&self) -> Option<Pos2> {
        self.smooth
    }

    pub fn previous(&self) -> Option<Pos2> {
        self.prev
    }

    /// Blend in a raw sample and return the directional delta
    /// `-mult * (smoothed_now - smoothed_prev)`.
    pub fn update(&mut self, raw: Pos2) -> Vec2 {
        let current = self.smooth.unwrap_or(raw);
        let next = Pos2::new(
            (current.x * self.k + raw.x) / (self.k + 1.0),
            (current.y * self.k + raw.y) / (self.k + 1.0),
        );
        self.prev = Some(current);
        self.smooth = Some(next);
        -self.mult * (next - current)
    }
}
