//! Browser native-messaging host for NFC readers.
//!
//! A browser extension talks to this host over stdin/stdout using
//! length-prefixed JSON messages. The host enumerates PC/SC readers, watches
//! one of them for cards, and pushes each card's UID back to the extension.
//!
//! # Crate Structure
//!
//! - [`frame`]: native-messaging framing (little-endian length prefix + JSON)
//! - [`reader`]: reader access trait, PC/SC backend (behind `pcsc`) and mock
//! - [`host`]: command dispatcher, card watch loop and bridge session

/// Re-export frame types.
pub mod frame {
    pub use nfcbridge_frame::*;
}

/// Re-export reader types.
pub mod reader {
    pub use nfcbridge_reader::*;
}

/// Re-export host types.
pub mod host {
    pub use nfcbridge_host::*;
}
