//! Error types for springle.
//!
//! Most of the pipeline recovers locally (clamping, fallbacks, eviction), so
//! these errors only surface at the few boundaries that can genuinely fail:
//! pointer validation, palette construction and loading configuration.

use thiserror::Error;

/// Errors reported by the pointer gesture tracker.
///
/// The tracker has already reset itself to idle when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    /// Position had a NaN or infinite coordinate.
    #[error("invalid pointer position ({x}, {y}): coordinates must be finite")]
    InvalidPosition { x: f32, y: f32 },
    /// `update_drag` was called without a drag in progress.
    #[error("no drag in progress")]
    NotDragging,
}

/// Errors that can occur while building or querying a palette table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaletteError {
    /// The table has no palettes at all.
    #[error("palette table is empty")]
    Empty,
    /// A palette does not have exactly the required number of colors.
    #[error("palette {palette} has {found} colors, expected {expected}")]
    WrongLength {
        palette: usize,
        found: usize,
        expected: usize,
    },
    /// A color component is outside 0..=255.
    #[error("palette {palette}, color {color}: component {value} out of range 0-255")]
    ComponentOutOfRange {
        palette: usize,
        color: usize,
        value: i32,
    },
    /// Transition factor was NaN or infinite.
    #[error("transition factor {0} is not finite")]
    InvalidTransition(f32),
}

/// Errors that can occur when loading configuration or writing output.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// File contents were not valid parameter JSON.
    #[error("failed to parse parameters: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to encode or save an image.
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}
