//! Error types for role chains, the permission index and authorizers

use std::fmt;
use thiserror::Error;

/// RBAC errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RbacError {
    /// No role chains were given to index construction
    #[error("no role chains provided")]
    NoRoleChains,

    /// Two roles flatten to the same `{chain}.{role}` name
    #[error("duplicate role {0}")]
    DuplicateRole(String),

    /// A role's effective permission list contains the same entry twice
    #[error("duplicate permission {permission} in role {role}")]
    DuplicatePermission {
        /// The repeated permission
        permission: String,
        /// Flattened name of the offending role
        role: String,
    },

    /// Errors accumulated while resolving roles asynchronously
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl RbacError {
    /// Whether this error was raised while building an index
    pub fn is_configuration(&self) -> bool {
        !matches!(self, RbacError::Resolution(_))
    }
}

/// Combined failures of an authorizer's role resolvers
///
/// Messages are sorted and unique, and display joined by `"; "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    messages: Vec<String>,
}

impl ResolutionError {
    pub(crate) fn new(mut messages: Vec<String>) -> Self {
        messages.sort();
        messages.dedup();
        Self { messages }
    }

    /// The individual error messages
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether any message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("; "))
    }
}

impl std::error::Error for ResolutionError {}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
