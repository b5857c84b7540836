use thiserror::Error;

use crate::domain::error::DomainError;

/// Errors that are safe to expose to other modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppsCatalogError {
    /// Client input was rejected; `code` is stable and machine readable.
    #[error("Validation error [{code}]: {message}")]
    Validation { code: &'static str, message: String },

    #[error("App not found: {id}")]
    NotFound { id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Store unavailable")]
    StoreUnavailable,
}

impl AppsCatalogError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. } => code,
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl From<DomainError> for AppsCatalogError {
    fn from(domain_error: DomainError) -> Self {
        match domain_error {
            DomainError::Search(e) => Self::validation(e.code(), e.to_string()),
            DomainError::Validation { field, message } => {
                Self::validation("INVALID_INPUT", format!("{field}: {message}"))
            }
            DomainError::AppNotFound { id } => Self::not_found(id),
            DomainError::AppAlreadyExists { id } => {
                Self::conflict(format!("app '{id}' already exists"))
            }
            DomainError::VersionAlreadyExists { id, version } => {
                Self::conflict(format!("app '{id}' already has version '{version}'"))
            }
            DomainError::StoreUnavailable { .. } => Self::StoreUnavailable,
        }
    }
}
