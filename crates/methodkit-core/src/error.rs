use thiserror::Error;

#[derive(Debug, Error)]
pub enum MethodError {
    #[error("not initialized: run 'methodkit init'")]
    NotInitialized,

    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("no methodology.yaml found for namespace '{0}'")]
    MethodologyNotFound(String),

    #[error("invalid namespace '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidNamespace(String),

    #[error("invalid component path '{0}': expected namespace/type/id")]
    InvalidComponentPath(String),

    #[error("invalid component type '{0}': must be 'skills' or 'processes'")]
    InvalidComponentType(String),

    #[error("component not found: {0}")]
    ComponentNotFound(String),

    #[error("already installed: {0} (remove it first to reinstall)")]
    AlreadyInstalled(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MethodError>;
