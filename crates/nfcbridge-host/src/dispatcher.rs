//! Command handling and listener lifecycle.
//!
//! The dispatcher is the only owner of the listener state. The watch loop
//! never touches it; it reports fatal failure through the relay's
//! escalation channel, which is drained before every command.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use nfcbridge_reader::{ReaderAccess, ReaderError};

use crate::protocol::{Command, Response, NO_READERS_AVAILABLE};
use crate::relay::{EventRelay, Generation};
use crate::sink::Outbound;
use crate::watch::{CardWatch, WatchConfig, WatchHandle};

/// Dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Reported by `get-version`.
    pub version: String,
    /// Upper bound on waiting for a watch loop to exit.
    pub stop_timeout: Duration,
    pub watch: WatchConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            stop_timeout: Duration::from_secs(1),
            watch: WatchConfig::default(),
        }
    }
}

enum ListenerState {
    Idle,
    Listening {
        reader_index: usize,
        reader_name: String,
        handle: WatchHandle,
    },
}

/// Turns commands into responses and runs at most one watch loop.
pub struct Dispatcher {
    reader: Arc<dyn ReaderAccess>,
    relay: EventRelay,
    escalations: Receiver<Generation>,
    state: ListenerState,
    next_generation: Generation,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        reader: Arc<dyn ReaderAccess>,
        outbound: Arc<dyn Outbound>,
        config: DispatcherConfig,
    ) -> Self {
        let (relay, escalations) = EventRelay::new(outbound);
        Self {
            reader,
            relay,
            escalations,
            state: ListenerState::Idle,
            next_generation: 1,
            config,
        }
    }

    /// Handle one raw inbound payload. Always yields exactly one response.
    pub fn handle(&mut self, raw: &str) -> Response {
        match Command::parse(raw) {
            Ok(command) => self.execute(command),
            Err(err) => {
                tracing::debug!(error = %err, "rejected command");
                self.reap_escalations();
                err.into()
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Response {
        self.reap_escalations();
        tracing::debug!(action = command.action(), "dispatching command");

        match command {
            Command::GetVersion => Response::version(self.config.version.as_str()),
            Command::ListReaders => self.list_readers(),
            Command::StartListening { reader_index } => self.start_listening(reader_index),
            Command::StopListening => {
                self.stop_listening();
                Response::stopped()
            }
            Command::GetStatus => self.status(),
        }
    }

    pub fn is_listening(&mut self) -> bool {
        self.reap_escalations();
        matches!(self.state, ListenerState::Listening { .. })
    }

    /// Index and name of the reader being watched, if any.
    pub fn listening_on(&mut self) -> Option<(usize, &str)> {
        self.reap_escalations();
        match &self.state {
            ListenerState::Idle => None,
            ListenerState::Listening {
                reader_index,
                reader_name,
                ..
            } => Some((*reader_index, reader_name.as_str())),
        }
    }

    /// Stop any running watch loop.
    pub fn shutdown(&mut self) {
        self.stop_listening();
    }

    fn list_readers(&self) -> Response {
        match self.reader.list_readers() {
            Ok(readers) => Response::readers(readers),
            Err(err) => {
                tracing::warn!(error = %err, "reader enumeration failed");
                Response::readers(Vec::new())
            }
        }
    }

    fn start_listening(&mut self, requested: i64) -> Response {
        self.stop_listening();

        let readers = match self.reader.list_readers() {
            Ok(readers) => readers,
            Err(ReaderError::NoReaders) => Vec::new(),
            Err(err) => return Response::error(format!("Failed to start listening: {err}")),
        };
        if readers.is_empty() {
            return Response::error(NO_READERS_AVAILABLE);
        }

        let Some((reader_index, reader_name)) = usize::try_from(requested)
            .ok()
            .and_then(|index| readers.get(index).map(|name| (index, name.clone())))
        else {
            return Response::error(format!("Invalid reader index: {requested}"));
        };

        let generation = self.next_generation;
        self.next_generation += 1;

        self.relay.activate(generation);
        let watch = CardWatch::new(
            Arc::clone(&self.reader),
            reader_name.as_str(),
            generation,
            self.relay.clone(),
            self.config.watch.clone(),
        );
        let handle = match watch.spawn() {
            Ok(handle) => handle,
            Err(err) => {
                self.relay.deactivate();
                return Response::error(format!("Failed to start listening: {err}"));
            }
        };

        tracing::info!(generation, reader_index, reader = %reader_name, "listening");
        let response = Response::started(reader_index, reader_name.as_str());
        self.state = ListenerState::Listening {
            reader_index,
            reader_name,
            handle,
        };
        response
    }

    fn stop_listening(&mut self) {
        let ListenerState::Listening { handle, .. } =
            std::mem::replace(&mut self.state, ListenerState::Idle)
        else {
            return;
        };

        self.relay.deactivate();
        let generation = handle.generation();
        let joined = handle.stop(self.config.stop_timeout);
        tracing::info!(generation, joined, "stopped listening");
    }

    fn status(&self) -> Response {
        let ListenerState::Listening { reader_name, .. } = &self.state else {
            return Response::status(false, false);
        };

        let card_present = self.reader.is_present(reader_name).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "presence probe failed");
            false
        });
        Response::status(true, card_present)
    }

    fn reap_escalations(&mut self) {
        while let Ok(generation) = self.escalations.try_recv() {
            let current = match &self.state {
                ListenerState::Listening { handle, .. } => handle.generation(),
                ListenerState::Idle => continue,
            };
            if current != generation {
                tracing::debug!(generation, current, "ignoring stale escalation");
                continue;
            }

            tracing::info!(generation, "watch loop gave up, listener now idle");
            self.stop_listening();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop_listening();
    }
}

#[cfg(test)]
mod tests {
    use nfcbridge_reader::MockReaderAccess;
    use serde_json::{json, Value};

    use super::*;
    use crate::sink::EventLog;

    fn dispatcher(mock: MockReaderAccess) -> (Dispatcher, Arc<MockReaderAccess>) {
        let mock = Arc::new(mock);
        let dispatcher = Dispatcher::new(
            mock.clone(),
            Arc::new(EventLog::new()),
            DispatcherConfig {
                version: "9.9.9".into(),
                ..DispatcherConfig::default()
            },
        );
        (dispatcher, mock)
    }

    fn reply(dispatcher: &mut Dispatcher, raw: &str) -> Value {
        serde_json::to_value(dispatcher.handle(raw)).unwrap()
    }

    #[test]
    fn get_version_uses_configured_string() {
        let (mut d, _) = dispatcher(MockReaderAccess::new());
        assert_eq!(
            reply(&mut d, r#"{"action":"get-version"}"#),
            json!({"success": true, "version": "9.9.9"})
        );
    }

    #[test]
    fn list_readers_failure_is_not_an_error() {
        let (mut d, mock) = dispatcher(MockReaderAccess::with_readers(["ACR122U"]));
        mock.fail_listing(Some(ReaderError::ServiceUnavailable));
        let value = reply(&mut d, r#"{"action":"list-readers"}"#);
        assert_eq!(value["success"], true);
        assert_eq!(value["count"], 0);
        assert!(value["message"].is_string());
    }

    #[test]
    fn start_validates_index() {
        let (mut d, _) = dispatcher(MockReaderAccess::with_readers(["ACR122U"]));
        for (index, expected) in [(1, "Invalid reader index: 1"), (-1, "Invalid reader index: -1")] {
            let raw = format!(r#"{{"action":"start-listening","readerIndex":{index}}}"#);
            assert_eq!(
                reply(&mut d, &raw),
                json!({"success": false, "error": expected})
            );
        }
        assert!(!d.is_listening());
    }

    #[test]
    fn start_without_readers_fails() {
        let (mut d, _) = dispatcher(MockReaderAccess::new());
        assert_eq!(
            reply(&mut d, r#"{"action":"start-listening","readerIndex":0}"#),
            json!({"success": false, "error": NO_READERS_AVAILABLE})
        );
    }

    #[test]
    fn start_with_enumeration_failure_reports_detail() {
        let (mut d, mock) = dispatcher(MockReaderAccess::with_readers(["ACR122U"]));
        mock.fail_listing(Some(ReaderError::ServiceUnavailable));
        let value = reply(&mut d, r#"{"action":"start-listening","readerIndex":0}"#);
        assert_eq!(
            value["error"],
            "Failed to start listening: smart card service unavailable"
        );
    }

    #[test]
    fn status_swallows_probe_failure() {
        let (mut d, mock) = dispatcher(MockReaderAccess::with_readers(["ACR122U"]));
        assert_eq!(
            reply(&mut d, r#"{"action":"get-status"}"#),
            json!({"success": true, "listening": false, "cardPresent": false})
        );

        reply(&mut d, r#"{"action":"start-listening","readerIndex":0}"#);
        mock.fail_probe(Some(ReaderError::Transport("probe".into())));
        assert_eq!(
            reply(&mut d, r#"{"action":"get-status"}"#),
            json!({"success": true, "listening": true, "cardPresent": false})
        );
        assert_eq!(d.listening_on(), Some((0, "ACR122U")));
        d.shutdown();
        assert!(!d.is_listening());
    }
}
