//! Harness-level errors
//!
//! Case failures never surface here; these abort the whole run.

use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("Duplicate case name: {0}")]
    DuplicateName(String),

    #[error("Invalid case name under {0}")]
    EmptyName(String),

    #[error("Case {path} panicked: {message}")]
    Panicked { path: String, message: String },

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl HarnessError {
    /// Attach the parent path to a registration failure
    pub(crate) fn registration(parent: Option<&str>, err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateName(name) => {
                HarnessError::DuplicateName(crate::models::join_path(parent, &name))
            }
            RegistryError::EmptyName => {
                HarnessError::EmptyName(parent.unwrap_or("<root>").to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for HarnessError {
    fn from(err: tokio::task::JoinError) -> Self {
        HarnessError::Runtime(err.to_string())
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
