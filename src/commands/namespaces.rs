// Namespace selection and listing
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use tokio::sync::watch;

use crate::error::Result;

/// Holds the currently selected namespace.
///
/// Subscribers see the current value immediately and then every change.
#[derive(Debug)]
pub struct NamespaceService {
    tx: watch::Sender<String>,
}

impl NamespaceService {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx }
    }

    pub fn selected(&self) -> String {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        let mut rx = self.tx.subscribe();
        // Make the current value count as a change for the new subscriber
        rx.mark_changed();
        rx
    }

    /// Selects `namespace`; subscribers are only woken if it differs.
    pub fn select(&self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.tx.send_if_modified(|current| {
            if *current == namespace {
                return false;
            }
            log::info!("namespaces: selected {namespace}");
            *current = namespace;
            true
        });
    }
}

/// Lists all namespaces in the active cluster, sorted by name.
pub async fn list_namespaces(client: Client) -> Result<Vec<String>> {
    let api: Api<Namespace> = Api::all(client);
    let mut names: Vec<String> = api
        .list(&ListParams::default())
        .await?
        .items
        .iter()
        .map(|ns| ns.name_any())
        .collect();
    names.sort();
    Ok(names)
}
