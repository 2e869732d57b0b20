use std::time::Duration;

use crate::error::Result;

/// Access to proximity-card readers.
///
/// Implementations are shared between the foreground dispatcher and the
/// background watch loop, so every method takes `&self` and the trait
/// requires `Send + Sync`. Readers are addressed by the names returned from
/// [`ReaderAccess::list_readers`].
pub trait ReaderAccess: Send + Sync {
    /// Names of the attached readers, in enumeration order.
    ///
    /// An empty list is a valid answer; implementations should not report
    /// "no readers" as an error when they can tell the difference.
    fn list_readers(&self) -> Result<Vec<String>>;

    /// Wait up to `timeout` for a card to be present.
    ///
    /// Returns `Ok(true)` immediately if a card is already present and
    /// `Ok(false)` if the timeout elapsed without one.
    fn wait_for_presence(&self, reader: &str, timeout: Duration) -> Result<bool>;

    /// Wait up to `timeout` for the reader to be empty.
    ///
    /// Returns `Ok(true)` immediately if no card is present and `Ok(false)`
    /// if a card is still present when the timeout elapses.
    fn wait_for_absence(&self, reader: &str, timeout: Duration) -> Result<bool>;

    /// Whether a card is present right now.
    fn is_present(&self, reader: &str) -> Result<bool>;

    /// Read the UID of the card on `reader` as uppercase hex.
    ///
    /// Fails with [`ReaderError::NotReady`](crate::ReaderError::NotReady) when
    /// the card moved mid-transaction.
    fn read_identifier(&self, reader: &str) -> Result<String>;
}

/// One enumerated reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderInfo {
    pub index: usize,
    pub name: String,
}

impl ReaderInfo {
    /// Pair each name with its position in the enumeration.
    pub fn enumerate(names: Vec<String>) -> Vec<ReaderInfo> {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| ReaderInfo { index, name })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerate_preserves_order() {
        let readers = ReaderInfo::enumerate(vec!["ACR122U".into(), "Omnikey".into()]);
        assert_eq!(readers[0].index, 0);
        assert_eq!(readers[0].name, "ACR122U");
        assert_eq!(readers[1].index, 1);
        assert_eq!(readers[1].name, "Omnikey");
    }
}
