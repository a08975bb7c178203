// List existing Codeservers via kube-rs
use async_trait::async_trait;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::{Client, ResourceExt};

use crate::config::ResourceConfig;
use crate::error::Result;
use crate::models::k8s::ResourceSummary;

/// Source of the resources that already exist in a namespace.
#[async_trait]
pub trait ResourceLister: Send + Sync {
    async fn list_resource_names(&self, namespace: &str) -> Result<Vec<ResourceSummary>>;
}

/// Lists the configured custom resource (Vscode by default) with a dynamic
/// kube-rs API, so no CRD types need to be compiled in.
#[derive(Clone)]
pub struct KubeResourceLister {
    client: Client,
    resource: ApiResource,
}

impl KubeResourceLister {
    pub fn new(client: Client, config: &ResourceConfig) -> Self {
        Self {
            client,
            resource: api_resource(config),
        }
    }
}

pub fn api_resource(config: &ResourceConfig) -> ApiResource {
    let gvk = GroupVersionKind::gvk(&config.group, &config.version, &config.kind);
    ApiResource::from_gvk_with_plural(&gvk, &config.plural)
}

#[async_trait]
impl ResourceLister for KubeResourceLister {
    async fn list_resource_names(&self, namespace: &str) -> Result<Vec<ResourceSummary>> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &self.resource);
        let list = api.list(&ListParams::default()).await?;

        log::debug!(
            "resources: {} {} in {namespace}",
            list.items.len(),
            self.resource.plural
        );

        Ok(list
            .items
            .iter()
            .map(|obj| ResourceSummary {
                name: obj.name_any(),
                namespace: obj.namespace(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_resource_uses_configured_plural() {
        let ar = api_resource(&ResourceConfig {
            group: "kubeflow.org".into(),
            version: "v1beta1".into(),
            kind: "Codeserver".into(),
            plural: "codeservers".into(),
        });

        assert_eq!(ar.api_version, "kubeflow.org/v1beta1");
        assert_eq!(ar.kind, "Codeserver");
        assert_eq!(ar.plural, "codeservers");
    }
}
