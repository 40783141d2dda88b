//! Errors raised while loading plans and catalogs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan element '{id}' is invalid: {reason}")]
    InvalidElement { id: String, reason: String },

    #[error("duplicate element id '{id}' in plan")]
    DuplicateElement { id: String },

    #[error("template '{id}' is invalid: {reason}")]
    InvalidTemplate { id: String, reason: String },

    #[error("duplicate template definition: {id}")]
    DuplicateTemplate { id: String },

    #[error("plan not found: {id}")]
    UnknownPlan { id: String },
}

impl PlanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_element(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_template(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
