//! Proximity-card reader access.
//!
//! Provides the contract the bridge needs from card hardware:
//! - Reader enumeration
//! - Card presence / absence waits with a timeout
//! - Reading a card's UID, with "not ready" distinguishable from other faults
//!
//! This is the lowest layer of nfcbridge. [`PcscReaderAccess`] (behind the
//! `pcsc` feature) talks to real readers; [`MockReaderAccess`] is an
//! in-memory double for tests and demos.

pub mod apdu;
pub mod error;
pub mod mock;
#[cfg(feature = "pcsc")]
pub mod pcsc_backend;
pub mod traits;
pub mod uid;

pub use apdu::{StatusWord, GET_UID_COMMAND};
pub use error::{ReaderError, Result};
pub use mock::MockReaderAccess;
#[cfg(feature = "pcsc")]
pub use pcsc_backend::PcscReaderAccess;
pub use traits::{ReaderAccess, ReaderInfo};
pub use uid::{format_uid, UidType};
