use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::constants::DEFAULT_MAXSIZE;
use crate::errors::Error;

// TOML file content
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_maxsize")]
    pub maxsize: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            maxsize: DEFAULT_MAXSIZE,
        }
    }
}

fn default_maxsize() -> usize {
    DEFAULT_MAXSIZE
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Cache bucket duration in seconds. Must be > 0, checked at load time.
    pub refresh_secs: u64,
    pub clusters: BTreeMap<String, ClusterConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub host: String,
    /// Name of the environment variable holding the bearer token.
    pub token_env: Option<String>,
    /// Inline token, mainly for local setups. `token_env` wins when both are set.
    pub token: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

impl DashboardConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: DashboardConfig =
            toml::from_str(&content).map_err(|source| Error::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Eager validation: a bad duration or cluster entry must fail at startup,
    /// never at lookup time.
    pub fn validate(&self) -> Result<(), Error> {
        if self.cache.maxsize == 0 {
            return Err(Error::InvalidEnvironmentConfig {
                environment: "*".to_string(),
                reason: "cache maxsize must be greater than zero".to_string(),
            });
        }

        for (env, env_config) in &self.environments {
            if env_config.refresh_secs == 0 {
                return Err(Error::InvalidEnvironmentConfig {
                    environment: env.clone(),
                    reason: "refresh_secs must be greater than zero".to_string(),
                });
            }

            for (cluster, cluster_config) in &env_config.clusters {
                if cluster_config.host.trim().is_empty() {
                    return Err(Error::InvalidClusterConfig {
                        environment: env.clone(),
                        cluster: cluster.clone(),
                        reason: "host must not be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn has_environment(&self, env: &str) -> bool {
        self.environments.contains_key(env)
    }

    pub fn environment(&self, env: &str) -> Result<&EnvironmentConfig, Error> {
        self.environments
            .get(env)
            .ok_or_else(|| Error::UnknownEnvironment {
                environment: env.to_string(),
            })
    }

    /// Bucket durations per environment, handed to the cache at construction.
    pub fn durations(&self) -> BTreeMap<String, Duration> {
        self.environments
            .iter()
            .map(|(env, config)| (env.clone(), Duration::from_secs(config.refresh_secs)))
            .collect()
    }
}

impl ClusterConfig {
    /// Resolves the bearer token, preferring the environment variable.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(var) = &self.token_env {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        self.token.clone()
    }
}
