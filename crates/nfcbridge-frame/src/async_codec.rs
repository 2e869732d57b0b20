//! `tokio_util::codec` adapter for hosts that run on a tokio runtime.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, encode_message, truncation_error, FrameConfig};
use crate::error::{FrameError, Result};

/// Native-messaging codec with the same limits and errors as
/// [`FrameReader`](crate::FrameReader) / [`FrameWriter`](crate::FrameWriter).
#[derive(Debug, Clone, Default)]
pub struct NativeMessageCodec {
    config: FrameConfig,
}

impl NativeMessageCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for NativeMessageCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        decode_message(src, self.config.max_inbound_payload)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        match truncation_error(src) {
            None => Ok(None),
            Some(err) => Err(err),
        }
    }
}

impl Encoder<&str> for NativeMessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.config.max_outbound_payload {
            return Err(FrameError::PayloadTooLarge {
                size: item.len(),
                max: self.config.max_outbound_payload,
            });
        }
        encode_message(item, dst)
    }
}

impl Encoder<String> for NativeMessageCodec {
    type Error = FrameError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&str>::encode(self, item.as_str(), dst)
    }
}
