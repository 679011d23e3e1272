use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::cache::CacheInfo;
use crate::clusters::{fetch_cluster_deployments, ClusterClient};
use crate::errors::Error;
use crate::schemas::{DeploymentInfo, ErrorEnvelope};
use crate::utils::{clock_stamp, datetime_stamp, unix_seconds};

use super::AppState;

type HandlerError = (StatusCode, Json<ErrorEnvelope>);

fn map_error(err: Error) -> HandlerError {
    let status = match &err {
        Error::UnknownEnvironment { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!("{err}");
    (status, Json(ErrorEnvelope::new(err.kind(), err.to_string())))
}

// ============================================================
// Health
// ============================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub date_time: String,
}

pub async fn get_health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        date_time: datetime_stamp(),
    })
}

// ============================================================
// Clusters
// ============================================================

#[derive(Serialize)]
pub struct ClustersResponse {
    pub status: &'static str,
    pub data: BTreeMap<String, Vec<String>>,
    pub date_time: String,
}

pub async fn list_clusters_handler(State(state): State<AppState>) -> Json<ClustersResponse> {
    let data = state
        .config
        .environments
        .iter()
        .map(|(env, env_config)| (env.clone(), env_config.clusters.keys().cloned().collect()))
        .collect();

    Json(ClustersResponse {
        status: "success",
        data,
        date_time: datetime_stamp(),
    })
}

// ============================================================
// Deployments
// ============================================================

#[derive(Serialize)]
pub struct DeploymentsResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<DeploymentInfo>,
    pub date_time: String,
}

/// Aggregates deployments across the environment's clusters, each cluster
/// going through the cache. One snapshot's fetch time stamps the response.
async fn collect_deployments(
    state: &AppState,
    env: &str,
    clients: Vec<Arc<ClusterClient>>,
) -> Result<DeploymentsResponse, Error> {
    let mut all_deployments = Vec::new();
    let mut cached_stamp = None;

    for client in clients {
        let producer_client = client.clone();
        let snapshot = state
            .cache
            .invoke(client.name(), env, move |_subject, _env, _epoch| {
                fetch_cluster_deployments(producer_client)
            })
            .await?;

        all_deployments.extend(snapshot.deployments);
        cached_stamp.get_or_insert(snapshot.fetched_at);
    }

    Ok(DeploymentsResponse {
        status: "success",
        message: None,
        data: all_deployments,
        date_time: cached_stamp.unwrap_or_else(datetime_stamp),
    })
}

pub async fn get_deployments_handler(
    Path(env): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeploymentsResponse>, HandlerError> {
    let env = env.to_lowercase();
    let clients = state.registry.clients_for(&env).map_err(map_error)?;

    collect_deployments(&state, &env, clients)
        .await
        .map(Json)
        .map_err(map_error)
}

// ============================================================
// Cache management
// ============================================================

pub async fn refresh_cache_handler(
    Path(env): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeploymentsResponse>, HandlerError> {
    let env = env.to_lowercase();
    tracing::info!(environment = %env, "cache refresh requested");

    state.cache.clear(Some(&env)).map_err(map_error)?;
    let clients = state.registry.rebuild(&env).map_err(map_error)?;

    let mut response = collect_deployments(&state, &env, clients)
        .await
        .map_err(map_error)?;
    response.message = Some(format!("Cache cleared and refreshed for {env} environment"));
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub date_time: String,
}

pub async fn clear_cache_handler(
    State(state): State<AppState>,
) -> Result<Json<ClearCacheResponse>, HandlerError> {
    state.cache.clear(None).map_err(map_error)?;
    state.registry.clear_all();

    Ok(Json(ClearCacheResponse {
        status: "success",
        message: "Cache cleared successfully",
        date_time: datetime_stamp(),
    }))
}

// ============================================================
// Cache introspection
// ============================================================

#[derive(Serialize)]
pub struct EnvCacheStatus {
    pub hits: u64,
    pub misses: u64,
    pub currsize: usize,
    pub duration: u64,
    pub last_access: Option<String>,
}

#[derive(Serialize)]
pub struct CacheStatusBody {
    pub total: CacheInfo,
    pub environments: BTreeMap<String, EnvCacheStatus>,
}

#[derive(Serialize)]
pub struct CacheStatusResponse {
    pub status: &'static str,
    pub cache_info: CacheStatusBody,
    pub date_time: String,
}

pub async fn get_cache_status_handler(
    State(state): State<AppState>,
) -> Result<Json<CacheStatusResponse>, HandlerError> {
    let mut environments = BTreeMap::new();

    for (env, env_config) in &state.config.environments {
        let info = state.cache.stats(Some(env)).map_err(map_error)?;
        let last_access = state
            .cache
            .last_access(env)
            .map_err(map_error)?
            .map(clock_stamp);

        environments.insert(
            env.clone(),
            EnvCacheStatus {
                hits: info.hits,
                misses: info.misses,
                currsize: info.currsize,
                duration: env_config.refresh_secs,
                last_access,
            },
        );
    }

    let total = state.cache.stats(None).map_err(map_error)?;

    Ok(Json(CacheStatusResponse {
        status: "success",
        cache_info: CacheStatusBody {
            total,
            environments,
        },
        date_time: datetime_stamp(),
    }))
}

#[derive(Serialize)]
pub struct EnvTimestamp {
    pub timestamp: f64,
    pub duration: u64,
    pub last_access: Option<f64>,
}

#[derive(Serialize)]
pub struct CacheTimestampResponse {
    pub status: &'static str,
    pub current_timestamp: f64,
    pub cache_timestamps: BTreeMap<String, EnvTimestamp>,
    pub date_time: String,
}

pub async fn get_cache_timestamp_handler(
    State(state): State<AppState>,
) -> Result<Json<CacheTimestampResponse>, HandlerError> {
    let mut cache_timestamps = BTreeMap::new();

    for (env, env_config) in &state.config.environments {
        // Read before computing the epoch: the epoch computation pins the
        // bucket alignment on first touch, and a never-accessed environment
        // must still report a null last_access.
        let last_access = state
            .cache
            .last_access(env)
            .map_err(map_error)?
            .map(unix_seconds);
        let epoch = state.cache.current_epoch(env).map_err(map_error)?;

        cache_timestamps.insert(
            env.clone(),
            EnvTimestamp {
                timestamp: unix_seconds(epoch),
                duration: env_config.refresh_secs,
                last_access,
            },
        );
    }

    Ok(Json(CacheTimestampResponse {
        status: "success",
        current_timestamp: unix_seconds(std::time::SystemTime::now()),
        cache_timestamps,
        date_time: datetime_stamp(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;

    fn state() -> AppState {
        let toml = r#"
            [environments.poc]
            refresh_secs = 120

            [environments.poc.clusters.minikube]
            host = "https://127.0.0.1:8443"
            token = "abc"
        "#;
        let config: DashboardConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        AppState::new(Arc::new(config))
    }

    #[tokio::test]
    async fn timestamp_reports_null_last_access_before_first_touch() {
        let state = state();

        let Json(first) = get_cache_timestamp_handler(State(state.clone()))
            .await
            .unwrap();
        let poc = &first.cache_timestamps["poc"];
        assert_eq!(poc.last_access, None);
        assert_eq!(poc.duration, 120);

        // The first read-out pinned the bucket alignment, so the second one
        // reports it, matching the epoch it derives from.
        let Json(second) = get_cache_timestamp_handler(State(state)).await.unwrap();
        let poc = &second.cache_timestamps["poc"];
        assert_eq!(poc.last_access, Some(poc.timestamp));
    }

    #[tokio::test]
    async fn status_lists_configured_environments_with_zeroed_counters() {
        let state = state();

        let Json(body) = get_cache_status_handler(State(state)).await.unwrap();
        let poc = &body.cache_info.environments["poc"];
        assert_eq!((poc.hits, poc.misses, poc.currsize), (0, 0, 0));
        assert_eq!(poc.last_access, None);
        assert_eq!(body.cache_info.total.currsize, 0);
    }
}
