/// Errors that can occur while encoding or transferring a display frame
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// Pixel buffer length is not a whole number of RGBA pixels
    #[error("malformed bitmap: {len} bytes is not a multiple of 4")]
    MalformedBitmap { len: usize },

    /// Pixel buffer length does not match the declared dimensions
    #[error("bitmap length mismatch: expected {expected} bytes, got {actual}")]
    BitmapLength { expected: usize, actual: usize },

    /// Bitmap dimensions do not match what the driver was configured for
    #[error("bitmap size mismatch: expected {expected:?}, got {actual:?}")]
    BitmapSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Encoded data does not fit into the transfer buffer
    #[error("buffer overflow: {needed} bytes needed, {remaining} remaining")]
    BufferOverflow { needed: usize, remaining: usize },

    /// The transport accepted fewer bytes than the buffer holds
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// No transport is attached to the driver
    #[error("no transport attached")]
    TransportUnavailable,

    /// Region or layout cannot be expressed in the wire format
    #[error("invalid region: {0}")]
    InvalidRegion(&'static str),

    /// HID communication error
    #[error("hid error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DisplayError>;
