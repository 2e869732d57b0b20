use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events follow `--log-level`.
const OWN_TARGETS: [&str; 4] = [
    "nfcbridge",
    "nfcbridge_frame",
    "nfcbridge_reader",
    "nfcbridge_host",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// `level` for the bridge's own crates, at most `warn` for dependencies.
pub fn targets(level: LogLevel) -> Targets {
    let level = level.as_filter();
    OWN_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, level)
        })
        .with_default(level.min(LevelFilter::WARN))
}

/// Install the global subscriber on stderr. In bridge mode stdout carries
/// the framed protocol, so nothing else may write there.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);
    let registry = tracing_subscriber::registry().with(targets(level));

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn own_crates_follow_requested_level() {
        let targets = targets(LogLevel::Debug);
        assert!(targets.would_enable("nfcbridge_host::watch", &Level::DEBUG));
        assert!(targets.would_enable("nfcbridge_reader::pcsc_backend", &Level::DEBUG));
        assert!(!targets.would_enable("nfcbridge_host::watch", &Level::TRACE));
    }

    #[test]
    fn dependencies_are_capped_at_warn() {
        let targets = targets(LogLevel::Trace);
        assert!(targets.would_enable("pcsc", &Level::WARN));
        assert!(!targets.would_enable("pcsc", &Level::INFO));

        let quiet = super::targets(LogLevel::Error);
        assert!(!quiet.would_enable("pcsc", &Level::WARN));
    }
}
