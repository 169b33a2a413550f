use thiserror::Error;

/// Errors that can occur while building shapes or extracting features.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("outline draws before any move command")]
    PathBeforeMove,

    #[error("unknown glyph name: {0}")]
    UnknownGlyph(String),

    #[error("glyph index {0} is out of range")]
    GlyphOutOfRange(u32),

    #[error("no glyph mapped to {0:?}")]
    UnmappedChar(char),

    #[error("row has {found} values but the dataset width is {expected}")]
    RowWidthMismatch { expected: usize, found: usize },

    #[error("cannot fix the dataset width from an empty row")]
    EmptyRow,

    #[error("dataset exceeds the u32 row limit of its header")]
    DatasetTooLarge,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "ufo")]
    #[error("norad error: {0}")]
    FontLoad(#[from] norad::error::FontLoadError),
}

pub type Result<T> = std::result::Result<T, Error>;
