use thiserror::Error;

/// Errors surfaced by the form backend.
///
/// None of these are fatal to a form interaction: callers turn them into
/// notifications and leave the form as it was.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(String),

    /// The fetched lab is missing fields the form needs.
    #[error("malformed Rok lab: {0}")]
    MalformedLab(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kubeconfig(msg: impl Into<String>) -> Self {
        Self::Kubeconfig(msg.into())
    }

    pub fn malformed_lab(msg: impl Into<String>) -> Self {
        Self::MalformedLab(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
