//! APDU helpers for the PC/SC "Get Data" UID command.

use crate::error::{ReaderError, Result};
use crate::uid::format_uid;

/// Get Data (UID): CLA=FF INS=CA P1=00 P2=00 Le=00 (any length).
pub const GET_UID_COMMAND: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// The trailing SW1/SW2 pair of a response APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord(pub u16);

impl StatusWord {
    pub const SUCCESS: StatusWord = StatusWord(0x9000);
    pub const NOT_READY: StatusWord = StatusWord(0x6300);

    pub fn from_bytes(sw1: u8, sw2: u8) -> Self {
        StatusWord(u16::from_be_bytes([sw1, sw2]))
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Human-readable meaning of common status words.
    pub fn description(self) -> &'static str {
        match self.0 {
            0x6300 => {
                "Card verification failed or card removed during operation. Keep card on reader."
            }
            0x6400 => "Card state unchanged (no data returned)",
            0x6A81 => "Function not supported",
            0x6A82 => "File or application not found",
            0x6A86 => "Incorrect parameters P1-P2",
            0x6A88 => "Referenced data not found",
            0x6B00 => "Wrong parameters P1-P2",
            0x6D00 => "Instruction not supported",
            0x6E00 => "Class not supported",
            0x6F00 => "No precise diagnosis (card internal error)",
            0x9000 => "Success",
            _ => "Unknown error",
        }
    }
}

/// Split a Get Data response into its UID, mapping status words to errors.
pub fn parse_uid_response(response: &[u8]) -> Result<String> {
    let Some((data, sw)) = response.split_last_chunk::<2>() else {
        return Err(ReaderError::Transport(format!(
            "short response APDU ({} bytes)",
            response.len()
        )));
    };

    let status = StatusWord::from_bytes(sw[0], sw[1]);
    if status == StatusWord::NOT_READY {
        return Err(ReaderError::NotReady);
    }
    if !status.is_success() {
        return Err(ReaderError::Status {
            sw: status.0,
            description: status.description(),
        });
    }
    if data.is_empty() {
        return Err(ReaderError::NoData);
    }

    Ok(format_uid(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_yields_uid() {
        let uid = parse_uid_response(&[0x04, 0xA1, 0xB2, 0xC3, 0x90, 0x00]).unwrap();
        assert_eq!(uid, "04A1B2C3");
    }

    #[test]
    fn status_6300_is_not_ready() {
        let err = parse_uid_response(&[0x63, 0x00]).unwrap_err();
        assert!(err.is_not_ready());
    }

    #[test]
    fn other_status_is_typed_failure() {
        let err = parse_uid_response(&[0x6A, 0x81]).unwrap_err();
        assert_eq!(
            err,
            ReaderError::Status {
                sw: 0x6A81,
                description: "Function not supported"
            }
        );
        assert!(!err.is_not_ready());
        assert!(err.to_string().contains("6A81"));
    }

    #[test]
    fn success_without_data_is_no_data() {
        assert_eq!(
            parse_uid_response(&[0x90, 0x00]).unwrap_err(),
            ReaderError::NoData
        );
    }

    #[test]
    fn short_response_is_transport_error() {
        assert!(matches!(
            parse_uid_response(&[0x90]),
            Err(ReaderError::Transport(_))
        ));
    }

    #[test]
    fn unknown_status_description() {
        assert_eq!(StatusWord(0x1234).description(), "Unknown error");
    }
}
