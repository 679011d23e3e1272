use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    clear_cache_handler, get_cache_status_handler, get_cache_timestamp_handler,
    get_deployments_handler, get_health_handler, list_clusters_handler, refresh_cache_handler,
};
use super::AppState;

pub fn create_health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(get_health_handler))
}

pub fn create_cache_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cache/refresh/{env}", post(refresh_cache_handler))
        .route("/api/cache/clear", post(clear_cache_handler))
        .route("/api/cache/status", get(get_cache_status_handler))
        .route("/api/cache/timestamp", get(get_cache_timestamp_handler))
}

pub fn create_deployment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/clusters", get(list_clusters_handler))
        .route("/api/{env}", get(get_deployments_handler))
}
