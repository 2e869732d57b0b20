//! The single outbound stream.
//!
//! Responses (dispatcher thread) and events (watch thread) share one
//! [`FrameWriter`]. Every message is serialized before the lock is taken and
//! written whole while it is held, so frames never interleave.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nfcbridge_frame::FrameWriter;
use serde::Serialize;

use crate::error::Result;
use crate::protocol::{Event, Response};

/// Destination for unsolicited events.
pub trait Outbound: Send + Sync {
    fn send_event(&self, event: &Event) -> Result<()>;
}

/// Lock-protected framed writer, cloneable across threads.
pub struct FrameSink<W> {
    writer: Arc<Mutex<FrameWriter<W>>>,
}

impl<W> Clone for FrameSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: Write> FrameSink<W> {
    pub fn new(writer: FrameWriter<W>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Serialize `message` and write it as one frame.
    pub fn send_json<T: Serialize + ?Sized>(&self, message: &T) -> Result<()> {
        let payload = serde_json::to_string(message)?;
        self.lock().send(&payload)?;
        Ok(())
    }

    pub fn send_response(&self, response: &Response) -> Result<()> {
        self.send_json(response)
    }

    fn lock(&self) -> MutexGuard<'_, FrameWriter<W>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Outbound for FrameSink<W> {
    fn send_event(&self, event: &Event) -> Result<()> {
        self.send_json(event)
    }
}

/// In-memory [`Outbound`] that records every event.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Outbound for EventLog {
    fn send_event(&self, event: &Event) -> Result<()> {
        self.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::thread;

    use nfcbridge_frame::FrameReader;
    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            // One byte at a time so an unlocked writer would interleave.
            let mut inner = self.0.lock().unwrap();
            inner.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_senders_never_interleave_frames() {
        let buf = SharedBuf::default();
        let sink = FrameSink::new(FrameWriter::new(buf.clone()));

        let workers: Vec<_> = (0..4)
            .map(|i| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        if i % 2 == 0 {
                            sink.send_response(&Response::status(true, false)).unwrap();
                        } else {
                            sink.send_event(&Event::card_detected("04A1B2C3")).unwrap();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let bytes = buf.0.lock().unwrap().clone();
        let messages: Vec<String> = FrameReader::new(Cursor::new(bytes))
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(messages.len(), 100);
        for message in messages {
            let value: Value = serde_json::from_str(&message).unwrap();
            assert!(value.get("success").is_some() || value.get("event").is_some());
        }
    }

    #[test]
    fn event_log_records_in_order() {
        let log = EventLog::new();
        assert!(log.is_empty());
        log.send_event(&Event::card_detected("04A1B2C3")).unwrap();
        log.send_event(&Event::card_detected("04A1B2C3D4E5F6")).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0], Event::card_detected("04A1B2C3"));
    }
}
