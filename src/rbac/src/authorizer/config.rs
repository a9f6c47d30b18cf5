//! Authorizer configuration

use serde::{Deserialize, Serialize};

/// Authorizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Hold roles returned by a resolver even when the index does not
    /// define them. They are reported by `err()` either way.
    pub hold_unknown_roles: bool,

    /// Emit a warning for every resolution failure as it is recorded
    pub log_resolution_errors: bool,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            hold_unknown_roles: true,
            log_resolution_errors: true,
        }
    }
}

impl AuthorizerConfig {
    /// Drop unknown resolver roles instead of holding them
    pub fn strict() -> Self {
        Self {
            hold_unknown_roles: false,
            ..Self::default()
        }
    }
}
