use std::sync::Arc;

use clap::Parser;

use crate::{
    api::{start_api_server, AppState},
    cli::types::{LogFormat, LogLevel},
    config::{DashboardConfig, DEFAULT_CONFIG_PATH},
    logging::{configure_global_tracing, LogConfig},
};

#[derive(Parser, Debug)]
#[command(about = "Start the dashboard API server")]
pub struct ServeCommand {
    #[arg(
        short = 'H',
        long,
        default_value = "127.0.0.1",
        help = "Host address to bind the API server"
    )]
    pub host: String,

    #[arg(
        short = 'p',
        long,
        default_value = "5000",
        help = "Port number to bind the API server"
    )]
    pub port: u16,

    #[arg(long, default_value = "false", help = "Force IPv6 usage")]
    pub ipv6: bool,

    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Path to the dashboard configuration file"
    )]
    pub config: String,

    #[arg(
        long,
        help = "Override the configured per-environment cache entry limit"
    )]
    pub cache_maxsize: Option<usize>,

    #[arg(
        short,
        long,
        default_value = "info",
        value_enum,
        help = "Logging level"
    )]
    pub log_level: LogLevel,

    #[arg(long, help = "Path to log file (if not specified, logs go to stdout)")]
    pub log_file: Option<String>,

    #[arg(long, default_value = "pretty", value_enum, help = "Log output format")]
    pub log_format: LogFormat,

    #[arg(
        long,
        help = "Maximum number of log files to retain (only applies if log_file is set)"
    )]
    pub log_max_files: Option<usize>,
}

impl ServeCommand {
    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let log_config = LogConfig {
            level: self.log_level,
            format: self.log_format,
            file_path: self.log_file.clone(),
            max_log_files: self.log_max_files,
        };
        configure_global_tracing(log_config);

        let mut config = DashboardConfig::load(&self.config)?;
        if let Some(maxsize) = self.cache_maxsize {
            config.cache.maxsize = maxsize;
            config.validate()?;
        }

        println!();
        println!("Release Dashboard v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Configuration:");
        println!("  → Host: {}", self.host);
        println!("  → Port: {}", self.port);
        println!("  → Config File: {}", self.config);
        println!("  → Cache Maxsize: {}", config.cache.maxsize);
        println!("  → Environments:");
        for (env, env_config) in &config.environments {
            println!(
                "      {} (refresh {}s, {} cluster{})",
                env,
                env_config.refresh_secs,
                env_config.clusters.len(),
                if env_config.clusters.len() == 1 { "" } else { "s" }
            );
        }
        println!();

        let state = AppState::new(Arc::new(config));
        let is_v4 = if self.ipv6 { Some(false) } else { None };
        start_api_server(self.host.clone(), self.port, is_v4, state).await
    }
}
