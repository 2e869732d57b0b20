//! Length-prefixed message framing for browser native-messaging hosts.
//!
//! Every message on the duplex stream is framed as:
//! - A 4-byte little-endian payload length
//! - Exactly that many bytes of UTF-8 text (JSON in practice)
//!
//! Callers get whole messages or a typed error; partial reads and
//! partial writes are handled here.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::NativeMessageCodec;
pub use codec::{
    decode_message, encode_message, truncation_error, FrameConfig, HEADER_SIZE,
    MAX_INBOUND_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
