/// Errors that end a bridge session.
///
/// Command-level failures never surface here; the dispatcher turns them
/// into `{success:false}` responses.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Framing error on the inbound or outbound stream.
    #[error("frame error: {0}")]
    Frame(#[from] nfcbridge_frame::FrameError),

    /// An outbound message could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
