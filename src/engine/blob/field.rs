/// Per-pixel state of the blob field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointData {
    /// Height of the blob at this point, compared against the moving threshold
    pub thresh_band: f32,
    /// Mix between the two fill categories
    pub color_band: f32,
}

impl PointData {
    pub fn new(thresh_band: f32, color_band: f32) -> Self {
        Self {
            thresh_band,
            color_band,
        }
    }
}

/// Two copies of the field: brushes write `pending`, sampling reads `visible`.
/// `flush` publishes pending writes once per tick.
#[derive(Debug, Clone)]
pub struct FieldBuffer {
    pending: Vec<PointData>,
    visible: Vec<PointData>,
}

impl FieldBuffer {
    pub fn new(data: Vec<PointData>) -> Self {
        Self {
            pending: data.clone(),
            visible: data,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_mut(&mut self) -> &mut [PointData] {
        &mut self.pending
    }

    pub fn visible(&self) -> &[PointData] {
        &self.visible
    }

    /// Copy of the latest (pending) state, used for undo checkpoints
    pub fn snapshot(&self) -> Vec<PointData> {
        self.pending.clone()
    }

    pub fn flush(&mut self) {
        self.visible.copy_from_slice(&self.pending);
    }

    /// Mirror every row of both copies
    pub fn mirror_rows(&mut self, width: usize) {
        for buffer in [&mut self.pending, &mut self.visible] {
            for row in buffer.chunks_mut(width) {
                row.reverse();
            }
        }
    }
}

/// Mutable view of the field centred on one pixel, handed to brush kernels
pub struct FieldCursor<'a> {
    pub(super) field: &'a mut FieldBuffer,
    pub(super) x: u32,
    pub(super) y: u32,
    pub(super) width: u32,
    pub(super) height: u32,
}

impl FieldCursor<'_> {
    pub fn point_mut(&mut self) -> &mut PointData {
        let i = (self.y * self.width + self.x) as usize;
        &mut self.field.pending_mut()[i]
    }

    /// Published value of a neighbour, `None` past the canvas edge
    pub fn neighbour(&self, x_offset: i32, y_offset: i32) -> Option<PointData> {
        let x = self.x as i32 + x_offset;
        let y = self.y as i32 + y_offset;
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let i = (y as u32 * self.width + x as u32) as usize;
        Some(self.field.visible()[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_hidden_until_flush() {
        let mut field = FieldBuffer::new(vec![PointData::default(); 4]);
        field.pending_mut()[1].thresh_band = 0.5;
        assert_eq!(field.visible()[1].thresh_band, 0.0);

        field.flush();
        assert_eq!(field.visible()[1].thresh_band, 0.5);
    }

    #[test]
    fn mirror_reverses_each_row() {
        let data = (0..6).map(|i| PointData::new(i as f32, 0.0)).collect();
        let mut field = FieldBuffer::new(data);
        field.mirror_rows(3);

        let bands: Vec<f32> = field.visible().iter().map(|p| p.thresh_band).collect();
        assert_eq!(bands, vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0]);
    }
}
