use std::io::{Read, Write};
use std::sync::Arc;

use nfcbridge_frame::{FrameConfig, FrameReader, FrameWriter};
use nfcbridge_reader::ReaderAccess;

use crate::dispatcher::{Dispatcher, DispatcherConfig};
use crate::error::Result;
use crate::sink::FrameSink;

/// Settings for one bridge session.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub frame: FrameConfig,
    pub dispatcher: DispatcherConfig,
}

/// What a completed session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub commands: u64,
}

/// Run the read-dispatch-write loop until `input` closes cleanly.
///
/// Command failures become error responses and never end the session; only
/// end of input or a framing/IO error does. The watch loop is stopped
/// before returning either way.
pub fn run_bridge<R, W>(
    input: R,
    output: W,
    reader: Arc<dyn ReaderAccess>,
    config: BridgeConfig,
) -> Result<SessionSummary>
where
    R: Read,
    W: Write + Send + 'static,
{
    let mut frames = FrameReader::with_config(input, config.frame.clone());
    let sink = FrameSink::new(FrameWriter::with_config(output, config.frame));
    let mut dispatcher = Dispatcher::new(reader, Arc::new(sink.clone()), config.dispatcher);

    let mut summary = SessionSummary { commands: 0 };
    let outcome = loop {
        let raw = match frames.read_message() {
            Ok(Some(raw)) => raw,
            Ok(None) => break Ok(()),
            Err(err) => break Err(err.into()),
        };

        summary.commands += 1;
        let response = dispatcher.handle(&raw);
        if let Err(err) = sink.send_response(&response) {
            break Err(err);
        }
    };

    dispatcher.shutdown();
    match outcome {
        Ok(()) => {
            tracing::info!(commands = summary.commands, "input closed, bridge exiting");
            Ok(summary)
        }
        Err(err) => {
            tracing::warn!(error = %err, "bridge session failed");
            Err(err)
        }
    }
}
