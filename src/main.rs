use clap::Parser;

use release_dashboard::cli::{Cli, Commands};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(command) => command.execute().await,
        Commands::Check(command) => command.execute(),
    }
}
