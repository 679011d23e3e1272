pub mod constants;
pub mod settings;

pub use constants::{DEFAULT_CONFIG_PATH, DEFAULT_MAXSIZE};
pub use settings::{ClusterConfig, DashboardConfig, EnvironmentConfig};
