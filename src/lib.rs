pub mod commands;
pub mod config;
pub mod error;
pub mod models;

use std::sync::Arc;

use commands::lab::{autofill_codeserver_lab, RokClient};
use commands::name::NameUniquenessValidator;
use commands::namespaces::NamespaceService;
use commands::notify::{LogNotifier, Notifier, SnackType};
use commands::resources::KubeResourceLister;
use commands::{kubeconfig, token};
use config::Settings;
use models::form::{FormModel, RokDataVolumeFactory};

pub use error::{Error, Result};

/// What a single spawner-form session should do.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub name: String,
    pub lab_url: Option<String>,
}

/// Installs the global logger. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already installed");
    }
}

/// Runs one form session against the cluster: follows the configured
/// namespace, validates the proposed name and, given a lab URL, autofills
/// the form from the Rok snapshot. Returns the resulting form.
pub async fn run(settings: Settings, opts: RunOptions) -> Result<FormModel> {
    let client = kubeconfig::client_for_context(settings.context.as_deref()).await?;
    let notifier = LogNotifier;

    let namespaces = NamespaceService::new(settings.namespace.clone());
    let lister = Arc::new(KubeResourceLister::new(client.clone(), &settings.resource));
    let mut validator = NameUniquenessValidator::watch(namespaces.subscribe(), lister);

    let namespace = namespaces.selected();
    if !validator.wait_for(&namespace).await {
        notifier.notify(
            &format!("Couldn't list existing Codeservers in {namespace}"),
            SnackType::Warning,
            None,
        );
    }

    let mut form = FormModel::with_defaults(opts.name.clone());
    match validator.show_name_error(&form.name) {
        Some(msg) => notifier.notify(&msg, SnackType::Error, None),
        None => log::info!("name: \"{}\" is available in {namespace}", form.name),
    }

    if let Some(url) = opts.lab_url {
        let token = token::get_rok_token(client, &namespace, &settings.rok).await;
        form.lab_url = url;
        // Failures were already reported to the user
        let _ = autofill_codeserver_lab(
            &mut form,
            &token.value,
            &RokClient::default(),
            &notifier,
            &RokDataVolumeFactory,
            &settings.notifications,
        )
        .await;
    }

    validator.close();
    Ok(form)
}
