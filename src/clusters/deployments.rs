//! Deployment listing: the producer behind the cache. Walks every namespace
//! of a cluster, lists its deployments, and extracts per-container image
//! versions.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;

use crate::clusters::ClusterClient;
use crate::errors::Error;
use crate::schemas::{ContainerImage, DeploymentInfo, DeploymentSnapshot};
use crate::utils::datetime_stamp;

/// Tag portion of an image reference, tolerating a sha256 digest suffix.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([^:@]+)(?:@sha256:.+)?$").unwrap());

// Kubernetes wire types, reduced to the fields the dashboard reads.

#[derive(Deserialize)]
struct NamespaceList {
    #[serde(default)]
    items: Vec<Namespace>,
}

#[derive(Deserialize)]
struct Namespace {
    metadata: ObjectMeta,
}

#[derive(Deserialize)]
struct ObjectMeta {
    name: String,
}

#[derive(Deserialize)]
struct DeploymentList {
    #[serde(default)]
    items: Vec<KubeDeployment>,
}

#[derive(Deserialize)]
struct KubeDeployment {
    metadata: ObjectMeta,
    spec: DeploymentSpec,
}

#[derive(Deserialize)]
struct DeploymentSpec {
    template: PodTemplateSpec,
}

#[derive(Deserialize)]
struct PodTemplateSpec {
    spec: PodSpec,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,
    #[serde(default)]
    init_containers: Vec<Container>,
}

#[derive(Deserialize)]
struct Container {
    #[serde(default)]
    image: String,
}

pub fn extract_version(image: &str) -> String {
    VERSION_PATTERN
        .captures(image)
        .map(|captures| captures[1].to_string())
        .unwrap_or_else(|| "None".to_string())
}

fn describe_containers(containers: &[Container]) -> Vec<ContainerImage> {
    containers
        .iter()
        .map(|container| ContainerImage {
            image: container.image.clone(),
            version: extract_version(&container.image),
        })
        .collect()
}

/// Fetches every deployment of one cluster. Failures propagate to the cache's
/// caller; nothing partial is returned or memoized.
pub async fn fetch_cluster_deployments(
    client: Arc<ClusterClient>,
) -> Result<DeploymentSnapshot, Error> {
    tracing::debug!(cluster = client.name(), "fetching deployments");

    let namespaces: NamespaceList = client.get_json("/api/v1/namespaces").await?;

    let mut deployments = Vec::new();
    for namespace in &namespaces.items {
        let list: DeploymentList = client
            .get_json(&format!(
                "/apis/apps/v1/namespaces/{}/deployments",
                namespace.metadata.name
            ))
            .await?;

        for deployment in list.items {
            let pod_spec = &deployment.spec.template.spec;
            deployments.push(DeploymentInfo {
                cluster: client.name().to_string(),
                deployment_name: deployment.metadata.name,
                namespace: namespace.metadata.name.clone(),
                main_containers: describe_containers(&pod_spec.containers),
                init_containers: describe_containers(&pod_spec.init_containers),
            });
        }
    }

    tracing::debug!(
        cluster = client.name(),
        count = deployments.len(),
        "deployments fetched"
    );

    Ok(DeploymentSnapshot {
        deployments,
        fetched_at: datetime_stamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_tag() {
        assert_eq!(extract_version("registry.local/app:1.4.2"), "1.4.2");
        assert_eq!(extract_version("nginx:latest"), "latest");
    }

    #[test]
    fn extracts_tag_before_digest() {
        assert_eq!(
            extract_version("registry.local/app:v2.0.1@sha256:0123456789abcdef"),
            "v2.0.1"
        );
    }

    #[test]
    fn missing_tag_reports_none() {
        assert_eq!(extract_version("registry.local/app"), "None");
        assert_eq!(extract_version(""), "None");
    }

    #[test]
    fn port_in_registry_host_is_not_a_tag() {
        // The last colon-separated segment wins, so the port alone never
        // masquerades as a version once a real tag is present.
        assert_eq!(extract_version("registry.local:5000/app:1.0.0"), "1.0.0");
    }

    #[test]
    fn deployment_list_parses_kubernetes_payload() {
        let payload = r#"{
            "items": [{
                "metadata": {"name": "api"},
                "spec": {"template": {"spec": {
                    "containers": [{"image": "registry.local/api:3.1.0"}],
                    "initContainers": [{"image": "registry.local/migrate:3.1.0"}]
                }}}
            }]
        }"#;

        let list: DeploymentList = serde_json::from_str(payload).unwrap();
        assert_eq!(list.items.len(), 1);
        let pod_spec = &list.items[0].spec.template.spec;
        assert_eq!(pod_spec.containers[0].image, "registry.local/api:3.1.0");
        assert_eq!(pod_spec.init_containers.len(), 1);

        let described = describe_containers(&pod_spec.containers);
        assert_eq!(described[0].version, "3.1.0");
    }
}
