use std::fmt;

/// Card UID size class, derived from the UID's byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidType {
    /// 4-byte UID.
    Single,
    /// 7-byte UID.
    Double,
    /// 10-byte UID.
    Triple,
    /// Any other byte length.
    Unknown(usize),
}

impl UidType {
    pub fn from_byte_len(len: usize) -> Self {
        match len {
            4 => UidType::Single,
            7 => UidType::Double,
            10 => UidType::Triple,
            other => UidType::Unknown(other),
        }
    }

    /// Classify a hex UID string (two characters per byte).
    pub fn from_hex(uid: &str) -> Self {
        Self::from_byte_len(uid.len() / 2)
    }
}

impl fmt::Display for UidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UidType::Single => f.write_str("Single size UID (4 bytes)"),
            UidType::Double => f.write_str("Double size UID (7 bytes)"),
            UidType::Triple => f.write_str("Triple size UID (10 bytes)"),
            UidType::Unknown(len) => write!(f, "Unknown UID type ({len} bytes)"),
        }
    }
}

/// Uppercase hex, no separators.
pub fn format_uid(bytes: &[u8]) -> String {
    use fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}
