use nfcbridge_reader::{ReaderError, UidType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound action: report the host version.
pub const ACTION_GET_VERSION: &str = "get-version";
/// Inbound action: enumerate readers.
pub const ACTION_LIST_READERS: &str = "list-readers";
/// Inbound action: start the card watch loop on one reader.
pub const ACTION_START_LISTENING: &str = "start-listening";
/// Inbound action: stop the card watch loop.
pub const ACTION_STOP_LISTENING: &str = "stop-listening";
/// Inbound action: report listener and card state.
pub const ACTION_GET_STATUS: &str = "get-status";

/// Shown when enumeration fails or finds nothing.
pub const NO_READERS_DETECTED: &str = "No readers detected. Please connect an NFC reader.";
/// Error for `start-listening` with no readers attached.
pub const NO_READERS_AVAILABLE: &str = "No readers available. Please connect an NFC reader.";

/// A parsed inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetVersion,
    ListReaders,
    /// Signed so that a negative index from the client is reported as an
    /// invalid index rather than a malformed command.
    StartListening { reader_index: i64 },
    StopListening,
    GetStatus,
}

/// Why an inbound payload could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Error processing command: {0}")]
    Malformed(String),
}

impl Command {
    /// Parse one inbound JSON payload.
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| CommandError::Malformed(err.to_string()))?;

        let action = value
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| CommandError::Malformed("missing string field `action`".into()))?;

        match action {
            ACTION_GET_VERSION => Ok(Command::GetVersion),
            ACTION_LIST_READERS => Ok(Command::ListReaders),
            ACTION_START_LISTENING => {
                let reader_index = value
                    .get("readerIndex")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        CommandError::Malformed("`readerIndex` must be an integer".into())
                    })?;
                Ok(Command::StartListening { reader_index })
            }
            ACTION_STOP_LISTENING => Ok(Command::StopListening),
            ACTION_GET_STATUS => Ok(Command::GetStatus),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::GetVersion => ACTION_GET_VERSION,
            Command::ListReaders => ACTION_LIST_READERS,
            Command::StartListening { .. } => ACTION_START_LISTENING,
            Command::StopListening => ACTION_STOP_LISTENING,
            Command::GetStatus => ACTION_GET_STATUS,
        }
    }
}

/// Outbound reply to exactly one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(flatten)]
    pub body: ResponseBody,
}

/// Action-specific response fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Version {
        version: String,
    },
    Readers {
        readers: Vec<String>,
        count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Started {
        message: String,
        #[serde(rename = "readerIndex")]
        reader_index: usize,
        #[serde(rename = "readerName")]
        reader_name: String,
    },
    Stopped {
        message: String,
    },
    Status {
        listening: bool,
        #[serde(rename = "cardPresent")]
        card_present: bool,
    },
    Error {
        error: String,
    },
}

impl Response {
    fn ok(body: ResponseBody) -> Self {
        Self {
            success: true,
            body,
        }
    }

    pub fn version(version: impl Into<String>) -> Self {
        Self::ok(ResponseBody::Version {
            version: version.into(),
        })
    }

    /// Reader list; an empty list always carries the "no readers" hint.
    pub fn readers(readers: Vec<String>) -> Self {
        let message = readers.is_empty().then(|| NO_READERS_DETECTED.to_string());
        Self::ok(ResponseBody::Readers {
            count: readers.len(),
            readers,
            message,
        })
    }

    pub fn started(reader_index: usize, reader_name: impl Into<String>) -> Self {
        let reader_name = reader_name.into();
        Self::ok(ResponseBody::Started {
            message: format!("Started listening on reader: {reader_name}"),
            reader_index,
            reader_name,
        })
    }

    pub fn stopped() -> Self {
        Self::ok(ResponseBody::Stopped {
            message: "Stopped listening".to_string(),
        })
    }

    pub fn status(listening: bool, card_present: bool) -> Self {
        Self::ok(ResponseBody::Status {
            listening,
            card_present,
        })
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            body: ResponseBody::Error {
                error: error.into(),
            },
        }
    }
}

impl From<CommandError> for Response {
    fn from(err: CommandError) -> Self {
        Response::error(err.to_string())
    }
}

/// Unsolicited outbound message from the watch loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    CardDetected {
        uid: String,
        #[serde(rename = "uidType")]
        uid_type: String,
    },
    Error {
        error: String,
    },
}

impl Event {
    pub fn card_detected(uid: impl Into<String>) -> Self {
        let uid = uid.into();
        let uid_type = UidType::from_hex(&uid).to_string();
        Event::CardDetected { uid, uid_type }
    }

    pub fn read_failure(err: &ReaderError) -> Self {
        Event::Error {
            error: format!("Error reading card: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_every_action() {
        let cases = [
            (r#"{"action":"get-version"}"#, Command::GetVersion),
            (r#"{"action":"list-readers"}"#, Command::ListReaders),
            (
                r#"{"action":"start-listening","readerIndex":2}"#,
                Command::StartListening { reader_index: 2 },
            ),
            (r#"{"action":"stop-listening"}"#, Command::StopListening),
            (r#"{"action":"get-status"}"#, Command::GetStatus),
        ];
        for (raw, expected) in cases {
            let command = Command::parse(raw).unwrap();
            assert_eq!(command, expected);
            assert_eq!(
                json!({ "action": command.action() })["action"],
                serde_json::from_str::<Value>(raw).unwrap()["action"]
            );
        }
    }

    #[test]
    fn negative_index_still_parses() {
        assert_eq!(
            Command::parse(r#"{"action":"start-listening","readerIndex":-1}"#).unwrap(),
            Command::StartListening { reader_index: -1 }
        );
    }

    #[test]
    fn unknown_action_is_reported_by_name() {
        let err = Command::parse(r#"{"action":"format-card"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Unknown action: format-card");
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        for raw in [
            "not json",
            "{}",
            r#"{"action":42}"#,
            r#"{"action":"start-listening"}"#,
            r#"{"action":"start-listening","readerIndex":"0"}"#,
            r#"{"action":"start-listening","readerIndex":1.5}"#,
        ] {
            let err = Command::parse(raw).unwrap_err();
            assert!(
                matches!(err, CommandError::Malformed(_)),
                "{raw} -> {err:?}"
            );
            assert!(err.to_string().starts_with("Error processing command: "));
        }
    }

    #[test]
    fn response_shapes() {
        assert_eq!(
            serde_json::to_value(Response::version("1.0.0")).unwrap(),
            json!({"success": true, "version": "1.0.0"})
        );
        assert_eq!(
            serde_json::to_value(Response::readers(vec!["ACR122U".into()])).unwrap(),
            json!({"success": true, "readers": ["ACR122U"], "count": 1})
        );
        assert_eq!(
            serde_json::to_value(Response::started(0, "ACR122U")).unwrap(),
            json!({
                "success": true,
                "message": "Started listening on reader: ACR122U",
                "readerIndex": 0,
                "readerName": "ACR122U"
            })
        );
        assert_eq!(
            serde_json::to_value(Response::status(true, false)).unwrap(),
            json!({"success": true, "listening": true, "cardPresent": false})
        );
        assert_eq!(
            serde_json::to_value(Response::error("boom")).unwrap(),
            json!({"success": false, "error": "boom"})
        );
    }

    #[test]
    fn empty_reader_list_carries_message() {
        assert_eq!(
            serde_json::to_value(Response::readers(Vec::new())).unwrap(),
            json!({
                "success": true,
                "readers": [],
                "count": 0,
                "message": NO_READERS_DETECTED
            })
        );
    }

    #[test]
    fn event_shapes() {
        assert_eq!(
            serde_json::to_value(Event::card_detected("04A1B2C3")).unwrap(),
            json!({
                "event": "card-detected",
                "uid": "04A1B2C3",
                "uidType": "Single size UID (4 bytes)"
            })
        );
        assert_eq!(
            serde_json::to_value(Event::read_failure(&ReaderError::NoData)).unwrap(),
            json!({
                "event": "error",
                "error": "Error reading card: no UID data returned from card"
            })
        );
    }
}
