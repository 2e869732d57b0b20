use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: a single 4-byte length.
pub const HEADER_SIZE: usize = 4;

/// Largest payload accepted from the client: 1 MiB.
pub const MAX_INBOUND_PAYLOAD: usize = 1024 * 1024;

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────┐
/// │ Length       │ Payload              │
/// │ (4B LE, u32) │ (Length bytes UTF-8) │
/// └──────────────┴──────────────────────┘
/// ```
pub fn encode_message(payload: &str, dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(len);
    dst.put_slice(payload.as_bytes());
    Ok(())
}

/// Decode one message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly one frame from the buffer. The declared
/// length is validated as soon as the header is available, so an oversized
/// frame is rejected without waiting for its body.
pub fn decode_message(src: &mut BytesMut, max_payload: usize) -> Result<Option<String>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&src[..HEADER_SIZE]);
    let declared = u32::from_le_bytes(header);
    let payload_len = declared as usize;

    if payload_len == 0 || payload_len > max_payload {
        return Err(FrameError::InvalidLength {
            length: declared,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len);
    let text = std::str::from_utf8(&payload)?;
    Ok(Some(text.to_owned()))
}

/// Classify what is left in the buffer when the stream ends.
///
/// `None` means the stream ended on a frame boundary (graceful end of
/// stream). Call only after [`decode_message`] returned `Ok(None)`.
pub fn truncation_error(remaining: &BytesMut) -> Option<FrameError> {
    match remaining.len() {
        0 => None,
        received if received < HEADER_SIZE => Some(FrameError::IncompleteHeader { received }),
        total => {
            let mut header = [0u8; HEADER_SIZE];
            header.copy_from_slice(&remaining[..HEADER_SIZE]);
            Some(FrameError::UnexpectedEnd {
                expected: u32::from_le_bytes(header) as usize,
                received: total - HEADER_SIZE,
            })
        }
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum inbound payload size in bytes. Default: 1 MiB.
    pub max_inbound_payload: usize,
    /// Maximum outbound payload size in bytes. Default: 1 MiB.
    pub max_outbound_payload: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_inbound_payload: MAX_INBOUND_PAYLOAD,
            max_outbound_payload: MAX_INBOUND_PAYLOAD,
        }
    }
}
