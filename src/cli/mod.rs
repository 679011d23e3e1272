mod commands;
pub mod types;

pub use commands::{CheckCommand, ServeCommand};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "release-dashboard",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dashboard API serving per-environment cluster deployment metadata",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Serve(ServeCommand),
    Check(CheckCommand),
}
