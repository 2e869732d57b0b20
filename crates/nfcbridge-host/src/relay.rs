//! Generation-gated event path.
//!
//! Each watch loop is tagged with a [`Generation`]. The relay only forwards
//! events whose generation is the live one, and it holds the gate lock for
//! the whole write, so after [`EventRelay::deactivate`] returns no event of
//! the old generation can reach the wire.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::protocol::Event;
use crate::sink::Outbound;

/// Identifies one watch loop instance.
pub type Generation = u64;

/// Shared between the dispatcher and its watch loop.
#[derive(Clone)]
pub struct EventRelay {
    live: Arc<Mutex<Option<Generation>>>,
    outbound: Arc<dyn Outbound>,
    escalations: Sender<Generation>,
}

impl EventRelay {
    /// Create a relay and the receiving end for loop escalations.
    pub fn new(outbound: Arc<dyn Outbound>) -> (Self, Receiver<Generation>) {
        let (escalations, rx) = mpsc::channel();
        let relay = Self {
            live: Arc::new(Mutex::new(None)),
            outbound,
            escalations,
        };
        (relay, rx)
    }

    pub fn activate(&self, generation: Generation) {
        *self.gate() = Some(generation);
    }

    /// Close the gate. Blocks while an event is being written.
    pub fn deactivate(&self) {
        *self.gate() = None;
    }

    pub fn is_live(&self, generation: Generation) -> bool {
        *self.gate() == Some(generation)
    }

    /// Forward `event` if `generation` is live. Returns whether it was sent.
    pub fn emit(&self, generation: Generation, event: &Event) -> bool {
        let gate = self.gate();
        if *gate != Some(generation) {
            tracing::debug!(generation, "dropping event from stale watch loop");
            return false;
        }

        match self.outbound.send_event(event) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(generation, error = %err, "failed to write event");
                false
            }
        }
    }

    /// Report that the loop for `generation` gave up on its own.
    pub fn escalate(&self, generation: Generation) {
        if self.escalations.send(generation).is_err() {
            tracing::debug!(generation, "escalation receiver gone");
        }
    }

    fn gate(&self) -> MutexGuard<'_, Option<Generation>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::EventLog;

    #[test]
    fn only_live_generation_is_forwarded() {
        let log = Arc::new(EventLog::new());
        let (relay, _rx) = EventRelay::new(log.clone());
        let event = Event::card_detected("04A1B2C3");

        assert!(!relay.emit(1, &event));
        relay.activate(1);
        assert!(relay.is_live(1));
        assert!(relay.emit(1, &event));
        assert!(!relay.emit(2, &event));

        relay.activate(2);
        assert!(!relay.emit(1, &event));
        relay.deactivate();
        assert!(!relay.emit(2, &event));

        assert_eq!(log.len(), 1);
    }

    #[test]
    fn escalations_reach_receiver() {
        let (relay, rx) = EventRelay::new(Arc::new(EventLog::new()));
        relay.escalate(7);
        assert_eq!(rx.try_recv().unwrap(), 7);
    }
}
