use crate::engine::{BrushHandle, ToolKind};

use super::field::FieldCursor;

/// How far along the smudge direction the source point is picked, in pixels
const SMUDGE_DIST_MULT: f32 = 16.0;
const OUTLINE_MULT: f32 = 0.625;

#[derive(Debug, Clone, PartialEq)]
enum Kernel {
    Paint { strength: f32, curve: f32, color: f32 },
    Outline { height: f32 },
    Smudge { dx: f32, dy: f32 },
    Color { color: f32 },
}

/// Brush handle for [`super::BlobCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub struct BlobBrush {
    size: f32,
    kernel: Kernel,
}

impl BlobBrush {
    pub fn paintbrush(size: f32, curve: f32, strength: f32) -> Self {
        Self {
            size,
            kernel: Kernel::Paint {
                strength,
                curve,
                color: 0.0,
            },
        }
    }

    pub fn outliner(size: f32) -> Self {
        Self {
            size,
            kernel: Kernel::Outline { height: 0.5 },
        }
    }

    pub fn smudger(size: f32) -> Self {
        Self {
            size,
            kernel: Kernel::Smudge { dx: 1.0, dy: 0.0 },
        }
    }

    pub fn colorer(size: f32) -> Self {
        Self {
            size,
            kernel: Kernel::Color { color: 0.0 },
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Apply the kernel to the point `(dx, dy)` away from the brush centre.
    /// Only the paintbrush distinguishes remove; the other kernels act the same for both buttons.
    pub(super) fn stamp(&self, dx: f32, dy: f32, mut cursor: FieldCursor<'_>, remove: bool) {
        let dist = (dx * dx + dy * dy).sqrt();
        let rad = self.size / 2.0;

        match self.kernel {
            Kernel::Paint { color, .. } => {
                let k = self.sample(dist);
                let point = cursor.point_mut();
                point.thresh_band = blend_thresh(point.thresh_band, k, remove);
                point.color_band = blend_color(point.color_band, 4.0 * k, color, remove);
            }
            Kernel::Outline { height } => {
                let k = (1.0 - (dist / rad).sqrt()) * OUTLINE_MULT * height;
                if k > 0.0 {
                    let point = cursor.point_mut();
                    point.thresh_band = (point.thresh_band + k).min(height);
                }
            }
            Kernel::Color { color } => {
                let k = (1.0 - (dist / rad).sqrt()) * OUTLINE_MULT;
                if k > 0.0 {
                    let point = cursor.point_mut();
                    point.color_band = if color > point.color_band {
                        (point.color_band + k).min(color)
                    } else {
                        (point.color_band - k).max(color)
                    };
                }
            }
            Kernel::Smudge { dx: vx, dy: vy } => smudge(dx, dy, dist, vx, vy, cursor),
        }
    }
}

fn smudge(dx: f32, dy: f32, dist: f32, vx: f32, vy: f32, mut cursor: FieldCursor<'_>) {
    if dist == 0.0 {
        return;
    }

    // Only points lying in the direction of travel are dragged
    let (nx, ny) = normalize(vx, vy);
    let dot = nx * (dx / dist) + ny * (dy / dist);
    if dot <= 0.0 {
        return;
    }

    let source_x = (vx * SMUDGE_DIST_MULT) as i32;
    let source_y = (vy * SMUDGE_DIST_MULT) as i32;
    if let Some(source) = cursor.neighbour(source_x, source_y) {
        let k = 2.0 * (1.0 + dist);
        let point = cursor.point_mut();
        point.thresh_band = lerpk(point.thresh_band, source.thresh_band, k);
        point.color_band = lerpk(point.color_band, source.color_band, k);
    }
}

fn blend_thresh(thresh: f32, k: f32, remove: bool) -> f32 {
    let value = if remove {
        thresh * (1.0 - k)
    } else {
        (thresh * (1.0 - k) + k).max(thresh)
    };
    value.clamp(0.0, 1.0)
}

fn blend_color(color: f32, k: f32, target: f32, remove: bool) -> f32 {
    let value = if remove {
        color
    } else {
        color * (1.0 - k) + target * k
    };
    value.clamp(0.0, 1.0)
}

/// Weighted average that keeps `k` parts of `x0` for every part of `x1`
pub(crate) fn lerpk(x0: f32, x1: f32, k: f32) -> f32 {
    (x0 * k + x1) / (k + 1.0)
}

fn normalize(x: f32, y: f32) -> (f32, f32) {
    let len = (x * x + y * y).sqrt();
    if len == 0.0 {
        (0.0, 0.0)
    } else {
        (x / len, y / len)
    }
}

impl BrushHandle for BlobBrush {
    fn kind(&self) -> ToolKind {
        match self.kernel {
            Kernel::Paint { .. } => ToolKind::Brush,
            Kernel::Outline { .. } => ToolKind::Outliner,
            Kernel::Smudge { .. } => ToolKind::Smudger,
            Kernel::Color { .. } => ToolKind::Colorer,
        }
    }

    fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    fn set_curve(&mut self, value: f32) {
        if let Kernel::Paint { curve, .. } = &mut self.kernel {
            *curve = value;
        }
    }

    fn set_strength(&mut self, value: f32) {
        if let Kernel::Paint { strength, .. } = &mut self.kernel {
            *strength = value;
        }
    }

    fn set_color(&mut self, value: f32) {
        match &mut self.kernel {
            Kernel::Paint { color, .. } | Kernel::Color { color } => *color = value,
            _ => {}
        }
    }

    fn set_outliner_height(&mut self, value: f32) {
        if let Kernel::Outline { height } = &mut self.kernel {
            *height = value;
        }
    }

    fn set_velocity(&mut self, vx: f32, vy: f32) {
        if let Kernel::Smudge { dx, dy } = &mut self.kernel {
            *dx = vx;
            *dy = vy;
        }
    }

    fn supports_velocity(&self) -> bool {
        matches!(self.kernel, Kernel::Smudge { .. })
    }

    fn sample(&self, dist: f32) -> f32 {
        match self.kernel {
            Kernel::Paint {
                strength, curve, ..
            } => strength / (1.0 + curve * dist),
            _ => 0.0,
        }
    }
}
