//! In-memory reader double.
//!
//! Lets tests and demos drive the bridge without hardware: place and remove
//! cards, script identifier reads, and inject failures. Waits block on a
//! condition variable, so a test that places a card wakes a waiting watch
//! loop immediately.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{ReaderError, Result};
use crate::traits::ReaderAccess;

/// A scriptable [`ReaderAccess`] implementation.
#[derive(Default)]
pub struct MockReaderAccess {
    state: Mutex<MockState>,
    changed: Condvar,
}

#[derive(Default)]
struct MockState {
    readers: Vec<String>,
    list_failure: Option<ReaderError>,
    card: Option<String>,
    read_script: VecDeque<Result<String>>,
    read_failure: Option<ReaderError>,
    wait_failure: Option<ReaderError>,
    probe_failure: Option<ReaderError>,
    reads: usize,
    hardware_calls: usize,
    max_hardware_calls: usize,
}

impl MockReaderAccess {
    /// An empty reader set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader set with the given names.
    pub fn with_readers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.set_readers(names);
        mock
    }

    /// Replace the reader set (hot-plug).
    pub fn set_readers<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().readers = names.into_iter().map(Into::into).collect();
        self.changed.notify_all();
    }

    /// Make `list_readers` fail (or succeed again with `None`).
    pub fn fail_listing(&self, failure: Option<ReaderError>) {
        self.lock().list_failure = failure;
    }

    /// Put a card with `uid` on the reader.
    pub fn place_card(&self, uid: impl Into<String>) {
        self.lock().card = Some(uid.into());
        self.changed.notify_all();
    }

    /// Take the card off the reader.
    pub fn remove_card(&self) {
        self.lock().card = None;
        self.changed.notify_all();
    }

    /// Queue outcomes for upcoming `read_identifier` calls.
    ///
    /// Scripted outcomes are consumed before the persistent failure and
    /// before the placed card's UID.
    pub fn script_reads<I>(&self, outcomes: I)
    where
        I: IntoIterator<Item = Result<String>>,
    {
        self.lock().read_script.extend(outcomes);
    }

    /// Make every unscripted `read_identifier` call fail.
    pub fn fail_reads(&self, failure: Option<ReaderError>) {
        self.lock().read_failure = failure;
    }

    /// Make presence/absence waits fail.
    pub fn fail_waits(&self, failure: Option<ReaderError>) {
        self.lock().wait_failure = failure;
        self.changed.notify_all();
    }

    /// Make `is_present` fail.
    pub fn fail_probe(&self, failure: Option<ReaderError>) {
        self.lock().probe_failure = failure;
    }

    /// Number of `read_identifier` calls so far.
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// Highest number of wait/read calls that were in progress at once.
    ///
    /// A single watch loop never exceeds 1.
    pub fn max_concurrent_hardware_calls(&self) -> usize {
        self.lock().max_hardware_calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> HardwareCall<'_> {
        let mut state = self.lock();
        state.hardware_calls += 1;
        state.max_hardware_calls = state.max_hardware_calls.max(state.hardware_calls);
        HardwareCall { mock: self }
    }

    fn wait_for(&self, reader: &str, timeout: Duration, want_card: bool) -> Result<bool> {
        let _call = self.enter();
        let state = self.lock();
        check_reader(&state, reader)?;

        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| {
                s.wait_failure.is_none() && s.card.is_some() != want_card
            })
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(failure) = &state.wait_failure {
            return Err(failure.clone());
        }
        check_reader(&state, reader)?;
        Ok(state.card.is_some() == want_card)
    }
}

impl ReaderAccess for MockReaderAccess {
    fn list_readers(&self) -> Result<Vec<String>> {
        let state = self.lock();
        match &state.list_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(state.readers.clone()),
        }
    }

    fn wait_for_presence(&self, reader: &str, timeout: Duration) -> Result<bool> {
        self.wait_for(reader, timeout, true)
    }

    fn wait_for_absence(&self, reader: &str, timeout: Duration) -> Result<bool> {
        self.wait_for(reader, timeout, false)
    }

    fn is_present(&self, reader: &str) -> Result<bool> {
        let state = self.lock();
        check_reader(&state, reader)?;
        match &state.probe_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(state.card.is_some()),
        }
    }

    fn read_identifier(&self, reader: &str) -> Result<String> {
        let _call = self.enter();
        let mut state = self.lock();
        check_reader(&state, reader)?;
        state.reads += 1;

        if let Some(outcome) = state.read_script.pop_front() {
            return outcome;
        }
        if let Some(failure) = &state.read_failure {
            return Err(failure.clone());
        }
        state.card.clone().ok_or(ReaderError::CardAbsent)
    }
}

fn check_reader(state: &MockState, reader: &str) -> Result<()> {
    if state.readers.iter().any(|name| name == reader) {
        Ok(())
    } else {
        Err(ReaderError::ReaderNotFound(reader.to_string()))
    }
}

struct HardwareCall<'a> {
    mock: &'a MockReaderAccess,
}

impl Drop for HardwareCall<'_> {
    fn drop(&mut self) {
        let mut state = self.mock.lock();
        state.hardware_calls = state.hardware_calls.saturating_sub(1);
    }
}
