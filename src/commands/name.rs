// Name uniqueness check against the selected namespace's Codeservers

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::commands::resources::ResourceLister;
use crate::error::Result;
use crate::models::k8s::ResourceSummary;

/// A failed rule on the name field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NameError {
    Required,
    ExistingName,
}

/// Outcome of the latest completed list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    Pending,
    Applied { namespace: String },
    Failed { namespace: String },
}

#[derive(Debug, Default)]
struct State {
    names: HashSet<String>,
    /// Namespace `names` was listed from.
    namespace: Option<String>,
    generation: u64,
    in_flight: Option<AbortHandle>,
    closed: bool,
    last_error: Option<String>,
}

struct Shared {
    state: Mutex<State>,
    refreshed: watch::Sender<Refresh>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts listing `namespace`, superseding any request still running.
    fn request(self: &Arc<Self>, namespace: String, lister: Arc<dyn ResourceLister>) {
        let mut state = self.lock();
        if state.closed {
            return;
        }

        state.generation += 1;
        let generation = state.generation;

        if let Some(prev) = state.in_flight.take() {
            log::debug!("names: superseding in-flight list (generation {})", generation - 1);
            prev.abort();
        }
        // An earlier outcome must not answer waiters for this request
        self.refreshed.send_replace(Refresh::Pending);

        let shared = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = lister.list_resource_names(&namespace).await;
            shared.apply(generation, namespace, result);
        });
        state.in_flight = Some(task.abort_handle());
    }

    fn apply(&self, generation: u64, namespace: String, result: Result<Vec<ResourceSummary>>) {
        let mut state = self.lock();
        if state.closed || state.generation != generation {
            log::debug!("names: dropping stale list for {namespace} (generation {generation})");
            return;
        }
        state.in_flight = None;

        match result {
            Ok(resources) => {
                state.names.clear();
                state.names.extend(resources.into_iter().map(|r| r.name));
                state.namespace = Some(namespace.clone());
                state.last_error = None;
                log::info!("names: {} existing name(s) in {namespace}", state.names.len());
                self.refreshed.send_replace(Refresh::Applied { namespace });
            }
            Err(e) => {
                log::warn!(
                    "names: listing {namespace} failed, keeping {} previous name(s): {e}",
                    state.names.len()
                );
                state.last_error = Some(e.to_string());
                self.refreshed.send_replace(Refresh::Failed { namespace });
            }
        }
    }

    fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.generation += 1;
        if let Some(task) = state.in_flight.take() {
            task.abort();
        }
    }
}

/// Checks proposed names against the Codeservers in the selected namespace.
///
/// Each namespace change starts a list request tagged with a new generation
/// and aborts the one it supersedes. A result whose generation is no longer
/// current is dropped, so the set always belongs to the most recently
/// requested namespace.
pub struct NameUniquenessValidator {
    shared: Arc<Shared>,
    refreshed: watch::Receiver<Refresh>,
    watcher: Option<JoinHandle<()>>,
}

impl Default for NameUniquenessValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameUniquenessValidator {
    pub fn new() -> Self {
        let (refreshed, rx) = watch::channel(Refresh::Pending);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                refreshed,
            }),
            refreshed: rx,
            watcher: None,
        }
    }

    /// Creates a validator that is already watching `namespaces`.
    pub fn watch(namespaces: watch::Receiver<String>, lister: Arc<dyn ResourceLister>) -> Self {
        let mut validator = Self::new();
        validator.start(namespaces, lister);
        validator
    }

    /// Follows `namespaces`, refetching the name set for its current value
    /// and for every change after that. Must run inside a tokio runtime.
    pub fn start(&mut self, namespaces: watch::Receiver<String>, lister: Arc<dyn ResourceLister>) {
        if let Some(prev) = self.watcher.take() {
            prev.abort();
        }
        let shared = Arc::clone(&self.shared);
        self.watcher = Some(tokio::spawn(watch_namespaces(namespaces, lister, shared)));
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops watching and abandons any running request; the name set is
    /// frozen from here on.
    pub fn close(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
        self.shared.close();
    }

    pub fn is_duplicate(&self, candidate: &str) -> bool {
        self.shared.lock().names.contains(candidate)
    }

    /// The uniqueness rule alone.
    pub fn existing_name(&self, value: &str) -> Option<NameError> {
        self.is_duplicate(value).then_some(NameError::ExistingName)
    }

    /// Every failed rule for `value`, required first.
    pub fn validate(&self, value: &str) -> Vec<NameError> {
        [required(value), self.existing_name(value)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Message to show under the name field, if any.
    pub fn show_name_error(&self, value: &str) -> Option<String> {
        let errors = self.validate(value);
        if errors.contains(&NameError::ExistingName) {
            Some(format!("Vscode Server \"{value}\" already exists"))
        } else if errors.contains(&NameError::Required) {
            Some("The Vscode Server's name can't be empty".to_string())
        } else {
            None
        }
    }

    pub fn names(&self) -> HashSet<String> {
        self.shared.lock().names.clone()
    }

    /// Namespace the current name set was listed from.
    pub fn namespace(&self) -> Option<String> {
        self.shared.lock().namespace.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }

    /// Waits until the latest request, if it is for `namespace`, completes
    /// and reports whether its names were applied. A request superseded
    /// before completing never resolves this.
    pub async fn wait_for(&self, namespace: &str) -> bool {
        let mut rx = self.refreshed.clone();
        let outcome = rx
            .wait_for(|r| match r {
                Refresh::Applied { namespace: ns } | Refresh::Failed { namespace: ns } => {
                    ns == namespace
                }
                Refresh::Pending => false,
            })
            .await;

        matches!(outcome.as_deref(), Ok(Refresh::Applied { .. }))
    }
}

impl Drop for NameUniquenessValidator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Required rule for the name field.
pub fn required(value: &str) -> Option<NameError> {
    value.is_empty().then_some(NameError::Required)
}

async fn watch_namespaces(
    mut namespaces: watch::Receiver<String>,
    lister: Arc<dyn ResourceLister>,
    shared: Arc<Shared>,
) {
    loop {
        let namespace = namespaces.borrow_and_update().clone();
        shared.request(namespace, Arc::clone(&lister));

        if namespaces.changed().await.is_err() {
            log::debug!("names: namespace source closed");
            break;
        }
    }
}
