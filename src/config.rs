use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_ENV: &str = "CODESERVER_FORM_CONFIG";
pub const NAMESPACE_ENV: &str = "CODESERVER_FORM_NAMESPACE";
pub const CONTEXT_ENV: &str = "CODESERVER_FORM_CONTEXT";

fn default_namespace() -> String {
    "kubeflow-user".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The custom resource the form creates, and whose names must be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            group: "kubeflow.org".to_string(),
            version: "v1".to_string(),
            kind: "Vscode".to_string(),
            plural: "vscodes".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RokConfig {
    /// Secret holding the Rok token; `{namespace}` is substituted.
    pub secret_name: String,
    pub token_key: String,
}

impl Default for RokConfig {
    fn default() -> Self {
        Self {
            secret_name: "secret-rok-{namespace}".to_string(),
            token_key: "token".to_string(),
        }
    }
}

impl RokConfig {
    pub fn secret_name_for(&self, namespace: &str) -> String {
        self.secret_name.replace("{namespace}", namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub success_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_duration_ms: 4000,
        }
    }
}

impl NotificationConfig {
    pub fn success_duration(&self) -> Duration {
        Duration::from_millis(self.success_duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Kubeconfig context to use instead of the current one.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub resource: ResourceConfig,
    #[serde(default)]
    pub rok: RokConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            context: None,
            resource: ResourceConfig::default(),
            rok: RokConfig::default(),
            notifications: NotificationConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Loads settings from the path picked by [`Settings::resolve_path`].
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(Self::resolve_path(explicit).as_deref())
    }

    /// `explicit`, else `$CODESERVER_FORM_CONFIG`, else the per-user config file.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(default_config_path)
    }

    /// A missing file yields the defaults; env overrides are applied last.
    /// Runs before the logger exists, so callers report the source themselves.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document is a valid, all-defaults config
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| Error::config(format!("failed to parse config: {e}")))
    }

    fn apply_env(&mut self) {
        if let Some(ns) = std::env::var(NAMESPACE_ENV).ok().filter(|v| !v.is_empty()) {
            self.namespace = ns;
        }
        if let Some(ctx) = std::env::var(CONTEXT_ENV).ok().filter(|v| !v.is_empty()) {
            self.context = Some(ctx);
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("codeserver-form").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_yaml_is_defaults() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let settings = Settings::from_yaml(
            "namespace: team-a\nrok:\n  secret_name: rok-{namespace}-token\n",
        )
        .unwrap();

        assert_eq!(settings.namespace, "team-a");
        assert_eq!(settings.rok.secret_name_for("team-a"), "rok-team-a-token");
        assert_eq!(settings.rok.token_key, "token");
        assert_eq!(settings.resource.plural, "vscodes");
        assert_eq!(
            settings.notifications.success_duration(),
            Duration::from_millis(4000)
        );
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let err = Settings::from_yaml("namespace: [unterminated").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "resource:\n  kind: Codeserver\n  plural: codeservers\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.resource.kind, "Codeserver");
        assert_eq!(settings.resource.group, "kubeflow.org");
    }

    fn clear_env() {
        for var in [CONFIG_ENV, NAMESPACE_ENV, CONTEXT_ENV] {
            std::env::remove_var(var);
        }
    }

    fn write_config(dir: &tempfile::TempDir, file: &str, body: &str) -> PathBuf {
        let path = dir.path().join(file);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    #[serial]
    fn explicit_path_beats_env_path() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_config(&dir, "explicit.yaml", "namespace: from-explicit\n");
        let from_env = write_config(&dir, "env.yaml", "namespace: from-env-file\n");
        std::env::set_var(CONFIG_ENV, &from_env);

        assert_eq!(Settings::resolve_path(Some(explicit.as_path())), Some(explicit.clone()));
        let settings = Settings::load(Some(explicit.as_path())).unwrap();
        assert_eq!(settings.namespace, "from-explicit");

        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.namespace, "from-env-file");
        clear_env();
    }

    #[test]
    #[serial]
    fn env_overrides_beat_file_values() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", "namespace: team-a\ncontext: dev\n");
        std::env::set_var(NAMESPACE_ENV, "team-b");
        std::env::set_var(CONTEXT_ENV, "prod");

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.namespace, "team-b");
        assert_eq!(settings.context.as_deref(), Some("prod"));
        clear_env();
    }

    #[test]
    #[serial]
    fn empty_env_values_are_ignored() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "config.yaml", "namespace: team-a\ncontext: dev\n");
        std::env::set_var(NAMESPACE_ENV, "");
        std::env::set_var(CONTEXT_ENV, "");

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.namespace, "team-a");
        assert_eq!(settings.context.as_deref(), Some("dev"));
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(dir.path().join("absent.yaml").as_path())).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
