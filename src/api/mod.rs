pub mod handlers;
pub mod routes;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::{CacheConfig, EnvironmentCache};
use crate::clusters::ClientRegistry;
use crate::config::DashboardConfig;
use crate::schemas::DeploymentSnapshot;

use routes::{create_cache_routes, create_deployment_routes, create_health_routes};

/// Shared handler state: the config, the cache, and the cluster-client
/// registry, each constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub cache: Arc<EnvironmentCache<DeploymentSnapshot>>,
    pub registry: Arc<ClientRegistry>,
}

impl AppState {
    pub fn new(config: Arc<DashboardConfig>) -> Self {
        let cache = Arc::new(EnvironmentCache::new(CacheConfig::from_settings(&config)));
        let registry = Arc::new(ClientRegistry::new(config.clone()));
        Self {
            config,
            cache,
            registry,
        }
    }
}

#[tracing::instrument(level = "info", name = "Api Server", skip(state))]
pub async fn start_api_server(
    host: String,
    port: u16,
    is_v4: Option<bool>,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(create_health_routes())
        .merge(create_cache_routes())
        .merge(create_deployment_routes())
        .layer(cors)
        .with_state(state);

    let ip = match is_v4 {
        Some(false) => IpAddr::V6(host.parse()?),
        _ => IpAddr::V4(host.parse()?),
    };

    let addr = SocketAddr::new(ip, port);
    tracing::info!("Starting dashboard API at http://{}", addr);
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
