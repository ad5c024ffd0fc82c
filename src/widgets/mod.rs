mod brush_graph;

pub use brush_graph::{BrushGraph, falloff_curve};
