#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod capture;
pub mod components;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod history;
pub mod input;
pub mod palette;
pub mod panels;
pub mod renderer;
pub mod tools;
pub mod util;
pub mod widgets;

pub use app::{AppSettings, PaintApp};
pub use capture::{CaptureCallbacks, CapturePipeline, CaptureState};
pub use config::PaintConfig;
pub use driver::{Clock, FrameRateEstimate, FrameScheduler, PaintLoop};
pub use engine::{BlobCanvas, BrushHandle, SimulationEngine, ToolKind};
pub use error::{PaintError, PaintResult};
pub use renderer::{Raster, Renderer, Surface};
pub use tools::Toolbox;
