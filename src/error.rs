//! Error types for buffer layout and export.

use thiserror::Error;

/// Result type alias using LayoutError.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Main error type for layout construction and document export.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Byte length of an input array is not a whole number of elements.
    #[error("Shape mismatch: {byte_length} bytes is not a multiple of the element size {element_size}")]
    ShapeMismatch { byte_length: usize, element_size: usize },

    /// Accessors were added but never closed into a buffer view.
    #[error("{pending} accessor(s) were never closed into a buffer view")]
    UnclosedBufferView { pending: usize },

    /// Buffer views were closed but never closed into a buffer.
    #[error("{pending} buffer view(s) were never closed into a buffer")]
    UnclosedBuffer { pending: usize },

    /// Failed to parse or serialize JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene refers to something that does not exist or is malformed.
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// The layout cannot be expressed in the output document.
    #[error("Export error: {0}")]
    Export(String),
}
