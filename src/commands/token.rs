// Rok token lookup from the namespace's secret
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::Client;

use crate::config::RokConfig;
use crate::models::lab::RokToken;

/// Reads the namespace's Rok token.
///
/// Never fails: a missing secret, a missing key or an API error all yield a
/// token with an empty value, logged as a warning, so the form still loads.
pub async fn get_rok_token(client: Client, namespace: &str, rok: &RokConfig) -> RokToken {
    let name = rok.secret_name_for(namespace);
    let api: Api<Secret> = Api::namespaced(client, namespace);

    match api.get_opt(&name).await {
        Ok(secret) => token_from_secret(&name, secret.as_ref(), &rok.token_key, namespace),
        Err(e) => {
            log::warn!("token: couldn't load Rok token in namespace '{namespace}': {e}");
            RokToken {
                name,
                value: String::new(),
            }
        }
    }
}

pub fn token_from_secret(
    name: &str,
    secret: Option<&Secret>,
    key: &str,
    namespace: &str,
) -> RokToken {
    let value = match secret.and_then(|s| s.data.as_ref()) {
        None => {
            log::warn!("token: Rok secret '{name}' doesn't exist in namespace '{namespace}'");
            String::new()
        }
        Some(data) => match data.get(key) {
            Some(bytes) => String::from_utf8_lossy(&bytes.0).into_owned(),
            None => {
                log::warn!("token: Rok secret '{name}' has no '{key}' key");
                String::new()
            }
        },
    };

    RokToken {
        name: name.to_string(),
        value,
    }
}
