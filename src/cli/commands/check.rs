use clap::Parser;

use crate::config::{DashboardConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(about = "Validate the dashboard configuration file and exit")]
pub struct CheckCommand {
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Path to the dashboard configuration file"
    )]
    pub config: String,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let config = DashboardConfig::load(&self.config)?;

        println!("Configuration OK: {}", self.config);
        println!("  cache maxsize: {}", config.cache.maxsize);
        for (env, env_config) in &config.environments {
            println!("  {} (refresh {}s)", env, env_config.refresh_secs);
            for (cluster, cluster_config) in &env_config.clusters {
                let token = match cluster_config.resolve_token() {
                    Some(_) => "token resolved",
                    None => "no token",
                };
                println!("      {} → {} ({})", cluster, cluster_config.host, token);
            }
        }

        Ok(())
    }
}
