use std::collections::HashMap;
use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;

use crate::error::{Error, Result};
use crate::models::k8s::KubeContext;

// ── helpers ───────────────────────────────────────────────────────────────────

/// Returns all regular, non-hidden files in `dir`, sorted alphabetically.
fn scan_kube_dir(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("kubeconfig: cannot read directory {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        // cache/, http-cache/ and dotfiles are never kubeconfigs
        .filter(|path| !path.is_dir())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            !name.starts_with('.')
        })
        .collect();

    paths.sort();
    paths
}

fn read_kubeconfig(path: &Path) -> Option<Kubeconfig> {
    if !path.exists() {
        log::info!("kubeconfig: skip (not found) {}", path.display());
        return None;
    }
    Kubeconfig::read_from(path)
        .inspect(|cfg| {
            log::info!("kubeconfig: ok ({} context(s)) {}", cfg.contexts.len(), path.display())
        })
        // ~/.kube holds plenty of files that are not kubeconfigs
        .inspect_err(|e| log::info!("kubeconfig: skip (parse error: {e}) {}", path.display()))
        .ok()
}

/// Merges every path that parses, kubectl style: the first file to set an
/// entry or `current-context` keeps it.
fn load_from_paths(paths: &[PathBuf]) -> Option<Kubeconfig> {
    paths
        .iter()
        .filter_map(|path| read_kubeconfig(path))
        .reduce(|merged, next| {
            merged.clone().merge(next).unwrap_or_else(|e| {
                log::warn!("kubeconfig: merge failed, keeping earlier files: {e}");
                merged
            })
        })
}

fn contexts_of(kubeconfig: &Kubeconfig) -> Vec<KubeContext> {
    let current = kubeconfig.current_context.clone().unwrap_or_default();

    let cluster_servers: HashMap<&str, String> = kubeconfig
        .clusters
        .iter()
        .filter_map(|nc| {
            let server = nc.cluster.as_ref()?.server.clone()?;
            Some((nc.name.as_str(), server))
        })
        .collect();

    kubeconfig
        .contexts
        .iter()
        .filter_map(|named| {
            let ctx = named.context.as_ref()?;
            Some(KubeContext {
                name: named.name.clone(),
                cluster: ctx.cluster.clone(),
                user: ctx.user.clone().unwrap_or_default(),
                namespace: ctx.namespace.clone(),
                is_active: named.name == current,
                server_url: cluster_servers.get(ctx.cluster.as_str()).cloned(),
            })
        })
        .collect()
}

// ── operations ────────────────────────────────────────────────────────────────

/// Loads the merged kubeconfig.
///
/// With `KUBECONFIG` set, every listed file is merged the way kubectl does.
/// Otherwise every regular file in `~/.kube` that parses as a kubeconfig is
/// merged, so dropping a new config there is enough to pick it up.
/// Returns `None` when nothing usable is found.
pub fn load_kubeconfig() -> Option<Kubeconfig> {
    let kube_env = std::env::var("KUBECONFIG").unwrap_or_default();

    if !kube_env.is_empty() {
        return match Kubeconfig::read() {
            Ok(cfg) => {
                log::info!("kubeconfig: KUBECONFIG merged {} context(s)", cfg.contexts.len());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("kubeconfig: reading KUBECONFIG failed: {e}");
                None
            }
        };
    }

    let kube_dir = dirs::home_dir()?.join(".kube");
    log::info!("kubeconfig: KUBECONFIG not set, scanning {}", kube_dir.display());
    load_from_paths(&scan_kube_dir(&kube_dir))
}

/// Lists all contexts from the merged kubeconfig; empty when there is none.
pub fn get_kubeconfig_contexts() -> Vec<KubeContext> {
    load_kubeconfig()
        .map(|cfg| contexts_of(&cfg))
        .unwrap_or_default()
}

/// Builds a client for `context` (or the current context). Falls back to the
/// in-cluster service account when no kubeconfig exists, which is how the
/// form backend runs inside Kubeflow.
pub async fn client_for_context(context: Option<&str>) -> Result<Client> {
    let config = match load_kubeconfig() {
        Some(kubeconfig) => {
            let options = KubeConfigOptions {
                context: context.map(str::to_string),
                ..Default::default()
            };
            kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| Error::kubeconfig(e.to_string()))?
        }
        None => {
            log::info!("kubeconfig: none found, using in-cluster config");
            kube::Config::incluster().map_err(|e| Error::kubeconfig(e.to_string()))?
        }
    };

    Ok(Client::try_from(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const DEV: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
- name: dev-cluster
  cluster:
    server: https://dev.example:6443
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
    namespace: team-a
users:
- name: dev-user
  user:
    token: abc
"#;

    const PROD: &str = r#"
apiVersion: v1
kind: Config
current-context: prod
clusters:
- name: prod-cluster
  cluster:
    server: https://prod.example:6443
contexts:
- name: prod
  context:
    cluster: prod-cluster
    user: prod-user
users:
- name: prod-user
  user:
    token: def
"#;

    #[test]
    fn scan_skips_dirs_and_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-config"), DEV).unwrap();
        std::fs::write(dir.path().join("a-config"), PROD).unwrap();
        std::fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
        std::fs::create_dir(dir.path().join("cache")).unwrap();

        let names: Vec<String> = scan_kube_dir(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a-config", "b-config"]);
    }

    #[test]
    fn merge_keeps_first_current_context() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("dev");
        let prod = dir.path().join("prod");
        let junk = dir.path().join("notes.txt");
        std::fs::write(&dev, DEV).unwrap();
        std::fs::write(&prod, PROD).unwrap();
        std::fs::write(&junk, "not: [a kubeconfig").unwrap();

        let merged = load_from_paths(&[dev, junk, prod]).unwrap();
        assert_eq!(merged.contexts.len(), 2);
        assert_eq!(merged.current_context.as_deref(), Some("dev"));
    }

    #[test]
    fn contexts_resolve_server_and_active_flag() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("dev");
        let prod = dir.path().join("prod");
        std::fs::write(&dev, DEV).unwrap();
        std::fs::write(&prod, PROD).unwrap();

        let merged = load_from_paths(&[dev, prod]).unwrap();
        let contexts = contexts_of(&merged);

        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].name, "dev");
        assert!(contexts[0].is_active);
        assert_eq!(contexts[0].namespace.as_deref(), Some("team-a"));
        assert_eq!(
            contexts[0].server_url.as_deref(),
            Some("https://dev.example:6443")
        );
        assert!(!contexts[1].is_active);
        assert_eq!(contexts[1].user, "prod-user");
    }

    #[test]
    fn missing_paths_yield_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_paths(&[dir.path().join("absent")]).is_none());
    }

    #[test]
    fn duplicate_context_names_keep_first_file() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("dev");
        let other = dir.path().join("other");
        std::fs::write(&dev, DEV).unwrap();
        std::fs::write(&other, DEV.replace("team-a", "team-z")).unwrap();

        let merged = load_from_paths(&[dev, other]).unwrap();
        let contexts = contexts_of(&merged);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].namespace.as_deref(), Some("team-a"));
    }

    #[test]
    #[serial]
    fn contexts_follow_kubeconfig_env() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("dev");
        let prod = dir.path().join("prod");
        std::fs::write(&dev, DEV).unwrap();
        std::fs::write(&prod, PROD).unwrap();
        let joined = std::env::join_paths([&prod, &dev]).unwrap();
        std::env::set_var("KUBECONFIG", &joined);

        let contexts = get_kubeconfig_contexts();
        std::env::remove_var("KUBECONFIG");

        let names: Vec<&str> = contexts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["prod", "dev"]);
        assert!(contexts[0].is_active);
        assert!(!contexts[1].is_active);
    }
}
