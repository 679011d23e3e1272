use std::io;

use time::macros::format_description;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::cli::types::{LogFormat, LogLevel};

pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file_path: Option<String>,
    pub max_log_files: Option<usize>,
}

fn file_writer(file_path: &str, max_files: usize) -> tracing_appender::non_blocking::NonBlocking {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_path)
        .filename_suffix("log")
        .max_log_files(max_files)
        .build("./logs")
        .expect("Failed to create rolling file appender");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // The guard must outlive the process for the writer to keep flushing.
    std::mem::forget(guard);
    non_blocking_file
}

pub fn configure_global_tracing(config: LogConfig) {
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));

    let level = tracing::Level::from(config.level);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("release_dashboard={}", level).parse().unwrap())
        .add_directive("tokio=warn".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap())
        .add_directive("tower_http=warn".parse().unwrap());

    let max_files = config.max_log_files.unwrap_or(7);

    let console_layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(true)
            .with_line_number(false)
            .with_file(true)
            .with_timer(timer.clone())
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(timer.clone())
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_timer(timer.clone())
            .with_writer(io::stdout)
            .boxed(),
    };

    let file_layer = config.file_path.as_deref().map(|file_path| {
        let writer = file_writer(file_path, max_files);
        match config.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_timer(timer.clone())
                .with_writer(writer)
                .boxed(),
            _ => fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .with_timer(timer.clone())
                .with_writer(writer)
                .boxed(),
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}
