use std::time::Duration;

use clap::{Args, Subcommand};
use nfcbridge_host::{DispatcherConfig, WatchConfig};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bridge;
pub mod list_readers;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the native-messaging bridge over stdin/stdout.
    #[command(alias = "native-messaging")]
    Bridge(BridgeArgs),
    /// List connected NFC readers.
    ListReaders(ListReadersArgs),
    /// Watch one reader and print every detected card.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Bridge(args) => bridge::run(args),
        Command::ListReaders(args) => list_readers::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Watch loop timings shared by `bridge` and `listen`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Card presence poll timeout (e.g. 100ms).
    #[arg(long, env = "NFCBRIDGE_PRESENCE_TIMEOUT", default_value = "100ms")]
    pub presence_timeout: String,
    /// Delay between detecting a card and reading it.
    #[arg(long, env = "NFCBRIDGE_SETTLE_DELAY", default_value = "50ms")]
    pub settle_delay: String,
    /// Upper bound on waiting for the watch loop to stop.
    #[arg(long, env = "NFCBRIDGE_STOP_TIMEOUT", default_value = "1s")]
    pub stop_timeout: String,
}

impl WatchArgs {
    pub fn dispatcher_config(&self) -> CliResult<DispatcherConfig> {
        Ok(DispatcherConfig {
            stop_timeout: parse_duration("stop timeout", &self.stop_timeout)?,
            watch: WatchConfig {
                presence_timeout: parse_duration("presence timeout", &self.presence_timeout)?,
                settle_delay: parse_duration("settle delay", &self.settle_delay)?,
                ..WatchConfig::default()
            },
            ..DispatcherConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    #[command(flatten)]
    pub watch: WatchArgs,
}

#[derive(Args, Debug, Default)]
pub struct ListReadersArgs {}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Reader index as printed by `list-readers`.
    #[arg(default_value = "0")]
    pub index: i64,
    #[command(flatten)]
    pub watch: WatchArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s` or a bare number of seconds.
pub fn parse_duration(what: &str, input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, format!("{what} must not be empty")));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid {what}: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, format!("{what} must be greater than zero")));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
