pub mod api;
pub mod cache;
pub mod cli;
pub mod clusters;
pub mod config;
pub mod errors;
pub mod logging;
pub mod schemas;
pub mod utils;
