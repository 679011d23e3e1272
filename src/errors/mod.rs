//! Error types shared across the dashboard service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Environment '{environment}' is not configured")]
    UnknownEnvironment { environment: String },

    #[error("Invalid configuration for environment '{environment}': {reason}")]
    InvalidEnvironmentConfig { environment: String, reason: String },

    #[error("Invalid configuration for cluster '{cluster}' in '{environment}': {reason}")]
    InvalidClusterConfig {
        environment: String,
        cluster: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cluster '{cluster}' request to {url} failed: {source}")]
    ClusterRequest {
        cluster: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Cluster '{cluster}' returned status {status} for {url}")]
    ClusterStatus {
        cluster: String,
        url: String,
        status: u16,
    },

    #[error("Failed to build HTTP client for cluster '{cluster}': {source}")]
    ClientBuild {
        cluster: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// Short machine-readable tag used in API error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownEnvironment { .. } => "InvalidEnvironment",
            Error::InvalidEnvironmentConfig { .. }
            | Error::InvalidClusterConfig { .. }
            | Error::ConfigRead { .. }
            | Error::ConfigParse { .. } => "ConfigurationError",
            Error::ClusterRequest { .. }
            | Error::ClusterStatus { .. }
            | Error::ClientBuild { .. } => "ClusterError",
        }
    }
}
