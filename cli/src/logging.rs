use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracelane_core::config::LoggingConfig;

/// Where log lines go while a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Plain commands write to stderr
    Stderr,
    /// The viewer owns the terminal: log to `logging.file`, or nowhere
    Viewer,
}

pub fn log_level(name: &str) -> tracing::Level {
    match name.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

pub fn init_logging(config: &LoggingConfig, target: LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_target(config.include_modules)
        .with_max_level(log_level(&config.level))
        .compact();

    let installed = match (target, &config.file) {
        (LogTarget::Viewer, None) => builder.with_writer(std::io::sink).try_init(),
        (_, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        (LogTarget::Stderr, None) => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
