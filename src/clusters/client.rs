use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::config::{ClusterConfig, DashboardConfig};
use crate::errors::Error;

/// HTTP client for one cluster's Kubernetes API.
pub struct ClusterClient {
    name: String,
    base_url: String,
    http: reqwest::Client,
}

impl ClusterClient {
    pub fn new(name: String, env: &str, config: &ClusterConfig) -> Result<Arc<Self>, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.resolve_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::InvalidClusterConfig {
                    environment: env.to_string(),
                    cluster: name.clone(),
                    reason: "token is not a valid header value".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            .build()
            .map_err(|source| Error::ClientBuild {
                cluster: name.clone(),
                source,
            })?;

        Ok(Arc::new(Self {
            base_url: config.host.trim_end_matches('/').to_string(),
            name,
            http,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = format!("{}{}", self.base_url, path);
        let response =
            self.http
                .get(&url)
                .send()
                .await
                .map_err(|source| Error::ClusterRequest {
                    cluster: self.name.clone(),
                    url: url.clone(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ClusterStatus {
                cluster: self.name.clone(),
                url,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|source| Error::ClusterRequest {
            cluster: self.name.clone(),
            url,
            source,
        })
    }
}

/// Per-environment cluster clients, built lazily on the first request for an
/// environment and rebuilt on an explicit cache refresh. Constructed once and
/// shared by reference with the handlers.
pub struct ClientRegistry {
    config: Arc<DashboardConfig>,
    clients: RwLock<HashMap<String, Vec<Arc<ClusterClient>>>>,
}

impl ClientRegistry {
    pub fn new(config: Arc<DashboardConfig>) -> Self {
        Self {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Clients for an environment, initializing them on first use.
    pub fn clients_for(&self, env: &str) -> Result<Vec<Arc<ClusterClient>>, Error> {
        if let Some(clients) = self.clients.read().unwrap().get(env) {
            return Ok(clients.clone());
        }
        self.build_env(env)
    }

    /// Drops and reconstructs an environment's clients.
    pub fn rebuild(&self, env: &str) -> Result<Vec<Arc<ClusterClient>>, Error> {
        self.clients.write().unwrap().remove(env);
        self.build_env(env)
    }

    pub fn clear_all(&self) {
        self.clients.write().unwrap().clear();
    }

    fn build_env(&self, env: &str) -> Result<Vec<Arc<ClusterClient>>, Error> {
        let env_config = self.config.environment(env)?;

        let mut built = Vec::with_capacity(env_config.clusters.len());
        for (name, cluster_config) in &env_config.clusters {
            built.push(ClusterClient::new(name.clone(), env, cluster_config)?);
        }
        tracing::info!(
            environment = env,
            clusters = built.len(),
            "initialized cluster clients"
        );

        self.clients
            .write()
            .unwrap()
            .insert(env.to_string(), built.clone());
        Ok(built)
    }
}
