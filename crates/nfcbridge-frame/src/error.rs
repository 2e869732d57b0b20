/// Errors that can occur during frame encoding/decoding.
///
/// Every decode-side variant means the inbound stream can no longer be
/// trusted; the process loop treats them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream closed after 1-3 bytes of a length header.
    #[error("incomplete length header ({received} of 4 bytes)")]
    IncompleteHeader { received: usize },

    /// The declared length is zero or above the inbound limit.
    #[error("invalid message length: {length} (expected 1..={max})")]
    InvalidLength { length: u32, max: usize },

    /// The stream closed before the declared payload was complete.
    #[error("unexpected end of stream ({received} of {expected} payload bytes)")]
    UnexpectedEnd { expected: usize, received: usize },

    /// The payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// An outbound payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output stream stopped accepting bytes mid-frame.
    #[error("output closed (incomplete frame)")]
    OutputClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
