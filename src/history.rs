use crate::engine::SimulationEngine;

/// Makes sure each stroke pushes exactly one undo checkpoint to the engine.
/// The checkpoints themselves live in the engine.
#[derive(Debug, Default)]
pub struct UndoCoordinator {
    /// Set between `begin_stroke` and `end_stroke`
    in_stroke: bool,
    pushed: usize,
}

impl UndoCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checkpoint at the leading edge of a stroke, before any brush is applied.
    /// Returns `false` if the stroke already has its checkpoint.
    pub fn begin_stroke<E: SimulationEngine>(&mut self, engine: &mut E) -> bool {
        if self.in_stroke {
            return false;
        }
        engine.push_undo();
        self.in_stroke = true;
        self.pushed += 1;
        true
    }

    pub fn end_stroke(&mut self) {
        self.in_stroke = false;
    }

    pub fn in_stroke(&self) -> bool {
        self.in_stroke
    }

    /// Checkpoints pushed by this coordinator so far
    pub fn checkpoints_pushed(&self) -> usize {
        self.pushed
    }

    /// Pop the latest checkpoint. An empty history is not an error.
    pub fn undo<E: SimulationEngine>(&mut self, engine: &mut E) -> bool {
        let restored = engine.try_pop_undo();
        if restored {
            log::info!("Restored undo checkpoint");
        } else {
            log::debug!("Undo requested with empty history");
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BlobCanvas;

    #[test]
    fn one_checkpoint_per_stroke() {
        let mut engine = BlobCanvas::new(8, 8).unwrap();
        let mut undo = UndoCoordinator::new();

        assert!(undo.begin_stroke(&mut engine));
        assert!(!undo.begin_stroke(&mut engine));
        undo.end_stroke();
        assert!(undo.begin_stroke(&mut engine));

        assert_eq!(undo.checkpoints_pushed(), 2);
        assert_eq!(engine.undo_depth(), 2);
    }

    #[test]
    fn undo_on_empty_history_is_noop() {
        let mut engine = BlobCanvas::new(8, 8).unwrap();
        let mut undo = UndoCoordinator::new();
        assert!(!undo.undo(&mut engine));
    }
}
