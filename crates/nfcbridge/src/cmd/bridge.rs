use std::sync::Arc;

use nfcbridge_host::{run_bridge, BridgeConfig};
use nfcbridge_reader::PcscReaderAccess;

use crate::cmd::BridgeArgs;
use crate::exit::{host_error, CliResult, SUCCESS};

pub fn run(args: BridgeArgs) -> CliResult<i32> {
    let config = BridgeConfig {
        dispatcher: args.watch.dispatcher_config()?,
        ..BridgeConfig::default()
    };

    tracing::info!(version = nfcbridge_host::VERSION, "native messaging host started");
    let summary = run_bridge(
        std::io::stdin().lock(),
        std::io::stdout(),
        Arc::new(PcscReaderAccess::new()),
        config,
    )
    .map_err(|err| host_error("bridge session failed", err))?;

    tracing::debug!(commands = summary.commands, "bridge session complete");
    Ok(SUCCESS)
}
