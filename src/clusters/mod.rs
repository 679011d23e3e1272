pub mod client;
pub mod deployments;

pub use client::{ClientRegistry, ClusterClient};
pub use deployments::fetch_cluster_deployments;
