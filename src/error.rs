use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pixel buffer length {0} is not a whole number of RGBA pixels")]
    PixelBufferLength(usize),

    #[error("max_colors must be between 1 and 256, got {0}")]
    InvalidMaxColors(usize),

    #[error("palette has {0} entries but a GIF color table holds at most 256")]
    PaletteTooLarge(usize),

    #[error("first frame must carry a palette")]
    MissingFirstFramePalette,

    #[error("index buffer holds {len} pixels but the frame is {width}x{height}")]
    IndexLengthMismatch { len: usize, width: u16, height: u16 },

    #[error("frame dimensions cannot be zero")]
    ZeroDimension,
}
