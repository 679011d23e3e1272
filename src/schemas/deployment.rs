use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ContainerImage {
    pub image: String,
    pub version: String,
}

/// One deployment row as rendered by the dashboard. Field names keep the
/// dashed wire format the frontend expects.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentInfo {
    pub cluster: String,
    #[serde(rename = "deployment-name")]
    pub deployment_name: String,
    pub namespace: String,
    #[serde(rename = "main-containers")]
    pub main_containers: Vec<ContainerImage>,
    #[serde(rename = "init-containers")]
    pub init_containers: Vec<ContainerImage>,
}

/// Producer output memoized by the cache: all deployments of one cluster plus
/// the display timestamp of the fetch.
#[derive(Debug, Clone)]
pub struct DeploymentSnapshot {
    pub deployments: Vec<DeploymentInfo>,
    pub fetched_at: String,
}
