use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nfcbridge_host::{Command, Dispatcher, ResponseBody};
use nfcbridge_reader::PcscReaderAccess;

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, FAILURE, HARDWARE_ERROR, INTERNAL, SUCCESS};
use crate::output::{ConsoleOutbound, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.watch.dispatcher_config()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut dispatcher = Dispatcher::new(
        Arc::new(PcscReaderAccess::new()),
        Arc::new(ConsoleOutbound::new(format)),
        config,
    );

    let response = dispatcher.execute(Command::StartListening {
        reader_index: args.index,
    });
    match response.body {
        ResponseBody::Started { reader_name, .. } => {
            eprintln!("Listening on reader: {reader_name}. Press Ctrl+C to stop.");
        }
        ResponseBody::Error { error } => return Err(CliError::new(FAILURE, error)),
        other => {
            return Err(CliError::new(
                INTERNAL,
                format!("unexpected start response: {other:?}"),
            ))
        }
    }

    while running.load(Ordering::SeqCst) {
        if !dispatcher.is_listening() {
            return Err(CliError::new(
                HARDWARE_ERROR,
                "card reads kept failing, stopped listening",
            ));
        }
        thread::sleep(POLL_INTERVAL);
    }

    dispatcher.shutdown();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
