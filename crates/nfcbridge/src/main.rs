mod cmd;
mod exit;
mod logging;
mod output;

use std::ffi::OsString;

use clap::Parser;

use crate::cmd::Command;
use crate::exit::{SUCCESS, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "nfcbridge", version, about = "NFC reader native-messaging host")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

/// Browsers start native hosts with no subcommand: Chrome passes the
/// caller's `chrome-extension://` origin, Firefox the manifest path. Either
/// form, or no arguments at all, means bridge mode.
fn normalize_args(mut args: Vec<OsString>) -> Vec<OsString> {
    let launched_by_browser = match args.get(1).and_then(|arg| arg.to_str()) {
        None => args.len() <= 1,
        Some(first) => first.starts_with("chrome-extension://") || first.ends_with(".json"),
    };

    if launched_by_browser {
        args.truncate(1);
        if args.is_empty() {
            args.push(OsString::from("nfcbridge"));
        }
        args.push(OsString::from("bridge"));
    }
    args
}

fn main() {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os().collect())) {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { USAGE } else { SUCCESS };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
