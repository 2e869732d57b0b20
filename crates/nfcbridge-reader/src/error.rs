/// Errors that can occur while talking to card readers.
///
/// Cloneable so test doubles can replay scripted failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReaderError {
    /// The card is not ready, typically because it moved mid-transaction.
    ///
    /// This is the only condition the watch loop retries.
    #[error("card not ready (status 6300): keep card on reader")]
    NotReady,

    /// The card answered with a non-success status word.
    #[error("failed to read UID, status {sw:04X}: {description}")]
    Status { sw: u16, description: &'static str },

    /// The card answered success but returned no UID bytes.
    #[error("no UID data returned from card")]
    NoData,

    /// No card is on the reader.
    #[error("no card present")]
    CardAbsent,

    /// The reader subsystem reports no readers at all.
    #[error("no readers available")]
    NoReaders,

    /// The named reader is not (or no longer) attached.
    #[error("reader not found: {0}")]
    ReaderNotFound(String),

    /// The PC/SC service is not running.
    #[error("smart card service unavailable")]
    ServiceUnavailable,

    /// Any other transport-level failure.
    #[error("reader transport error: {0}")]
    Transport(String),
}

impl ReaderError {
    /// True for the transient "not ready" condition.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ReaderError::NotReady)
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
