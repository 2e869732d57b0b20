//! PC/SC reader access.
//!
//! Each thread keeps its own PC/SC context: pcsc-lite expects one context per
//! thread, and the watch loop blocks in `SCardGetStatusChange` while the
//! dispatcher enumerates readers on another thread. A context that reports
//! the service gone is dropped and re-established on the next call, so the
//! bridge recovers when `pcscd` restarts.

use std::cell::RefCell;
use std::ffi::CString;
use std::time::Duration;

use pcsc::{Context, Disposition, Protocols, ReaderState, Scope, ShareMode, State};

use crate::apdu::{parse_uid_response, GET_UID_COMMAND};
use crate::error::{ReaderError, Result};
use crate::traits::ReaderAccess;

thread_local! {
    static CONTEXT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// [`ReaderAccess`] backed by the platform PC/SC service.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcscReaderAccess;

impl PcscReaderAccess {
    pub fn new() -> Self {
        Self
    }

    fn with_context<T>(
        &self,
        reader: Option<&str>,
        op: impl FnOnce(&Context) -> std::result::Result<T, pcsc::Error>,
    ) -> Result<T> {
        CONTEXT.with(|slot| {
            let mut slot = slot.borrow_mut();
            let context = match slot.as_ref() {
                Some(context) => context.clone(),
                None => {
                    let context = Context::establish(Scope::User)
                        .map_err(|err| map_pcsc_error(err, reader))?;
                    tracing::debug!("established PC/SC context");
                    *slot = Some(context.clone());
                    context
                }
            };

            op(&context).map_err(|err| {
                if matches!(
                    err,
                    pcsc::Error::NoService | pcsc::Error::ServiceStopped | pcsc::Error::InvalidHandle
                ) {
                    tracing::debug!(error = %err, "discarding PC/SC context");
                    *slot = None;
                }
                map_pcsc_error(err, reader)
            })
        })
    }

    fn current_state(&self, reader: &str) -> Result<State> {
        let name = reader_name(reader)?;
        self.with_context(Some(reader), |ctx| {
            let mut states = [ReaderState::new(name, State::UNAWARE)];
            match ctx.get_status_change(Duration::ZERO, &mut states) {
                Ok(()) | Err(pcsc::Error::Timeout) => Ok(states[0].event_state()),
                Err(err) => Err(err),
            }
        })
        .and_then(|state| check_available(state, reader))
    }

    fn wait_for_state(&self, reader: &str, timeout: Duration, want_card: bool) -> Result<bool> {
        let name = reader_name(reader)?;
        let reached = |state: State| state.contains(State::PRESENT) == want_card;

        let state = self.with_context(Some(reader), |ctx| {
            let mut states = [ReaderState::new(name, State::UNAWARE)];
            match ctx.get_status_change(Duration::ZERO, &mut states) {
                Ok(()) | Err(pcsc::Error::Timeout) => {}
                Err(err) => return Err(err),
            }
            if reached(states[0].event_state()) {
                return Ok(states[0].event_state());
            }

            states[0].sync_current_state();
            match ctx.get_status_change(timeout, &mut states) {
                Ok(()) | Err(pcsc::Error::Timeout) => Ok(states[0].event_state()),
                Err(err) => Err(err),
            }
        })?;

        let state = check_available(state, reader)?;
        Ok(reached(state))
    }
}

impl ReaderAccess for PcscReaderAccess {
    fn list_readers(&self) -> Result<Vec<String>> {
        let listed = self.with_context(None, |ctx| ctx.list_readers_owned());
        match listed {
            Ok(names) => Ok(names
                .iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect()),
            Err(ReaderError::NoReaders) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn wait_for_presence(&self, reader: &str, timeout: Duration) -> Result<bool> {
        self.wait_for_state(reader, timeout, true)
    }

    fn wait_for_absence(&self, reader: &str, timeout: Duration) -> Result<bool> {
        self.wait_for_state(reader, timeout, false)
    }

    fn is_present(&self, reader: &str) -> Result<bool> {
        Ok(self.current_state(reader)?.contains(State::PRESENT))
    }

    fn read_identifier(&self, reader: &str) -> Result<String> {
        let name = reader_name(reader)?;
        let response = self.with_context(Some(reader), |ctx| {
            let card = ctx.connect(&name, ShareMode::Shared, Protocols::ANY)?;
            let mut buf = [0u8; pcsc::MAX_BUFFER_SIZE];
            let response = card.transmit(&GET_UID_COMMAND, &mut buf).map(<[u8]>::to_vec);
            if let Err((_, err)) = card.disconnect(Disposition::LeaveCard) {
                tracing::debug!(error = %err, "card disconnect failed");
            }
            response
        })?;

        parse_uid_response(&response)
    }
}

fn reader_name(reader: &str) -> Result<CString> {
    CString::new(reader).map_err(|_| ReaderError::ReaderNotFound(reader.to_string()))
}

fn check_available(state: State, reader: &str) -> Result<State> {
    if state.intersects(State::UNKNOWN | State::UNAVAILABLE | State::IGNORE) {
        return Err(ReaderError::ReaderNotFound(reader.to_string()));
    }
    Ok(state)
}

fn map_pcsc_error(err: pcsc::Error, reader: Option<&str>) -> ReaderError {
    match err {
        pcsc::Error::NoService | pcsc::Error::ServiceStopped => ReaderError::ServiceUnavailable,
        pcsc::Error::NoReadersAvailable => ReaderError::NoReaders,
        pcsc::Error::UnknownReader | pcsc::Error::ReaderUnavailable => {
            ReaderError::ReaderNotFound(reader.unwrap_or_default().to_string())
        }
        pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard => ReaderError::CardAbsent,
        pcsc::Error::NotReady => ReaderError::NotReady,
        other => ReaderError::Transport(other.to_string()),
    }
}
