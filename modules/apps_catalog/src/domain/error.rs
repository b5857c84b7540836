use search_core::SearchError;
use thiserror::Error;

/// Domain-specific errors.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The search could not be compiled; nothing reached the store.
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("App not found: {id}")]
    AppNotFound { id: String },

    #[error("App '{id}' already exists")]
    AppAlreadyExists { id: String },

    #[error("App '{id}' already has version '{version}'")]
    VersionAlreadyExists { id: String, version: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn app_not_found(id: impl Into<String>) -> Self {
        Self::AppNotFound { id: id.into() }
    }

    pub fn app_already_exists(id: impl Into<String>) -> Self {
        Self::AppAlreadyExists { id: id.into() }
    }

    pub fn version_already_exists(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::VersionAlreadyExists {
            id: id.into(),
            version: version.into(),
        }
    }

    /// Keeps the whole context chain of a repository error.
    pub fn store(err: anyhow::Error) -> Self {
        Self::StoreUnavailable {
            message: format!("{err:#}"),
        }
    }
}
