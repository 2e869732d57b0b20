//! Background card watch loop.
//!
//! One loop polls one reader: wait for a card, let it settle, read its
//! identifier (retrying only "not ready"), report it, then wait until it is
//! removed. Consecutive failures are reported once and, past the limit, the
//! loop stops itself and escalates to the dispatcher.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nfcbridge_reader::{ReaderAccess, ReaderError};

use crate::protocol::Event;
use crate::relay::{EventRelay, Generation};

/// Timing and failure policy for a watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Timeout of each presence/absence wait. Bounds how long a stop
    /// request can go unnoticed.
    pub presence_timeout: Duration,
    /// Sleep after an empty poll or a failed iteration.
    pub idle_delay: Duration,
    /// Delay between detecting a card and reading it.
    pub settle_delay: Duration,
    /// Delay between "not ready" read attempts.
    pub retry_delay: Duration,
    /// Total read attempts per detected card.
    pub read_attempts: u32,
    /// Consecutive failures after which the loop gives up.
    pub max_consecutive_errors: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            presence_timeout: Duration::from_millis(100),
            idle_delay: Duration::from_millis(100),
            settle_delay: Duration::from_millis(50),
            retry_delay: Duration::from_millis(100),
            read_attempts: 3,
            max_consecutive_errors: 3,
        }
    }
}

/// A configured, not yet running watch loop.
pub struct CardWatch {
    reader: Arc<dyn ReaderAccess>,
    reader_name: String,
    generation: Generation,
    relay: EventRelay,
    config: WatchConfig,
}

impl CardWatch {
    pub fn new(
        reader: Arc<dyn ReaderAccess>,
        reader_name: impl Into<String>,
        generation: Generation,
        relay: EventRelay,
        config: WatchConfig,
    ) -> Self {
        Self {
            reader,
            reader_name: reader_name.into(),
            generation,
            relay,
            config,
        }
    }

    /// Start the loop on its own thread.
    pub fn spawn(self) -> io::Result<WatchHandle> {
        let generation = self.generation;
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name(format!("card-watch-{generation}"))
            .spawn({
                let running = Arc::clone(&running);
                move || self.run(&running, done_tx)
            })?;

        Ok(WatchHandle {
            generation,
            running,
            done: done_rx,
            thread: Some(thread),
        })
    }

    /// Sends on `done` when the loop returns. A panic drops the sender
    /// instead, which the owner sees as a disconnect.
    fn run(self, running: &AtomicBool, done: Sender<()>) {
        tracing::info!(
            generation = self.generation,
            reader = %self.reader_name,
            "card watch started"
        );

        let mut errors = 0u32;
        while running.load(Ordering::Acquire) {
            match self
                .reader
                .wait_for_presence(&self.reader_name, self.config.presence_timeout)
            {
                Ok(true) => {}
                Ok(false) => {
                    // An empty reader ends any run of failures.
                    errors = 0;
                    thread::sleep(self.config.idle_delay);
                    continue;
                }
                Err(err) => {
                    if self.fail(err, &mut errors, running) {
                        break;
                    }
                    continue;
                }
            }

            thread::sleep(self.config.settle_delay);
            if !running.load(Ordering::Acquire) {
                break;
            }

            match self.read_with_retry(running) {
                Ok(uid) => {
                    errors = 0;
                    tracing::debug!(generation = self.generation, %uid, "card detected");
                    self.relay
                        .emit(self.generation, &Event::card_detected(uid.as_str()));
                    self.wait_for_removal(running);
                }
                Err(err) => {
                    if self.fail(err, &mut errors, running) {
                        break;
                    }
                }
            }
        }

        tracing::info!(generation = self.generation, "card watch stopped");
        let _ = done.send(());
    }

    fn read_with_retry(&self, running: &AtomicBool) -> Result<String, ReaderError> {
        let attempts = self.config.read_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.reader.read_identifier(&self.reader_name) {
                Err(err) if err.is_not_ready() && attempt < attempts => {
                    tracing::debug!(
                        generation = self.generation,
                        attempt,
                        "card not ready, retrying"
                    );
                    attempt += 1;
                    thread::sleep(self.config.retry_delay);
                    if !running.load(Ordering::Acquire) {
                        return Err(err);
                    }
                }
                outcome => return outcome,
            }
        }
    }

    /// Block until the card is confirmed absent or the loop is stopped.
    ///
    /// Wait errors never count as removal; the card may still be there.
    fn wait_for_removal(&self, running: &AtomicBool) {
        let mut failing = false;
        while running.load(Ordering::Acquire) {
            match self
                .reader
                .wait_for_absence(&self.reader_name, self.config.presence_timeout)
            {
                Ok(true) => return,
                Ok(false) => failing = false,
                Err(err) => {
                    if !failing {
                        tracing::warn!(
                            generation = self.generation,
                            error = %err,
                            "absence wait failed, still waiting for removal"
                        );
                    }
                    failing = true;
                    thread::sleep(self.config.idle_delay);
                }
            }
        }
    }

    /// Count a failure. Returns true when the loop must exit.
    fn fail(&self, err: ReaderError, errors: &mut u32, running: &AtomicBool) -> bool {
        if !running.load(Ordering::Acquire) {
            return true;
        }

        *errors += 1;
        tracing::debug!(
            generation = self.generation,
            consecutive = *errors,
            error = %err,
            "card read failed"
        );
        if *errors == 1 {
            self.relay
                .emit(self.generation, &Event::read_failure(&err));
        }

        if *errors >= self.config.max_consecutive_errors {
            tracing::warn!(
                generation = self.generation,
                reader = %self.reader_name,
                error = %err,
                "too many consecutive read failures, stopping"
            );
            running.store(false, Ordering::Release);
            self.relay.escalate(self.generation);
            return true;
        }

        thread::sleep(self.config.idle_delay);
        false
    }
}

/// Owner's handle on a running watch loop.
pub struct WatchHandle {
    generation: Generation,
    running: Arc<AtomicBool>,
    done: Receiver<()>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether the loop still intends to run (false once stopped or escalated).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Request cancellation and wait up to `timeout` for the thread to exit.
    ///
    /// Returns false if the thread was still running at the deadline; it is
    /// then detached and any late events it produces are discarded by the
    /// relay.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.running.store(false, Ordering::Release);

        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(thread) = self.thread.take() {
                    if thread.join().is_err() {
                        tracing::warn!(generation = self.generation, "card watch panicked");
                    }
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    generation = self.generation,
                    ?timeout,
                    "card watch did not stop in time, detaching"
                );
                false
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
