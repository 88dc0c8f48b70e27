//! Rendering errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("nothing to render: no panels given")]
    NoPanels,

    #[error("cannot render an empty field")]
    EmptyField,

    #[error("panel shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("composite of {width}x{height} pixels is too large to encode")]
    TooLarge { width: usize, height: usize },

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
