use thiserror::Error;

/// Errors raised while loading or validating a [`crate::config::PaintConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config value `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// Errors raised by the bundled simulation engine
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Canvas size {width}x{height} is not supported (each side must be 1..=256)")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Errors produced while encoding or publishing a capture
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Frame encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Frame has {actual} pixels, expected {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    #[error("Failed to publish capture: {0}")]
    PublishFailed(#[from] std::io::Error),

    #[error("Unknown artifact reference: {0}")]
    UnknownArtifact(String),
}

impl From<image::ImageError> for CaptureError {
    fn from(error: image::ImageError) -> Self {
        CaptureError::EncodeFailed(error.to_string())
    }
}

/// Top level error for the paint application
#[derive(Debug, Error)]
pub enum PaintError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

pub type PaintResult<T> = Result<T, PaintError>;
