//! Native-messaging host core for NFC readers.
//!
//! Reads framed JSON commands, drives at most one background card watch
//! loop, and writes responses and unsolicited card events back over the
//! same framed stream.
//!
//! - [`protocol`]: command, response and event shapes
//! - [`sink`]: the shared, lock-protected outbound stream
//! - [`relay`]: generation-gated event path from watch loop to sink
//! - [`watch`]: the background card watch loop
//! - [`dispatcher`]: command handling and listener lifecycle
//! - [`bridge`]: the read-dispatch-write process loop

pub mod bridge;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod sink;
pub mod watch;

pub use bridge::{run_bridge, BridgeConfig, SessionSummary};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{HostError, Result};
pub use protocol::{Command, CommandError, Event, Response, ResponseBody};
pub use relay::{EventRelay, Generation};
pub use sink::{EventLog, FrameSink, Outbound};
pub use watch::{CardWatch, WatchConfig, WatchHandle};

/// Version reported by `get-version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
