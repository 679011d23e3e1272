use clap::ValueEnum;

/// Minimum severity emitted by the dashboard's tracing setup.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Console/file layout for log output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, colored; the default for interactive use.
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
    /// Single line per event.
    Compact,
}
