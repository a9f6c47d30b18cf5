//! Role chains
//!
//! A chain is an ordered list of roles where every role extends the
//! permissions of all roles added before it.

use serde::{Deserialize, Serialize};

/// Separator between chain name and role id in flattened role names
pub const ROLE_SEPARATOR: &str = ".";

/// A role that gives a list of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique id of the role within its chain (e.g., "Admin")
    pub id: String,

    /// Permissions the role gives
    ///
    /// Inside a [`RoleChain`] this is the effective list, inherited
    /// permissions first.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Role {
    /// Create a new role
    pub fn new(id: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            id: id.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A chain of roles which extend each other's permissions
///
/// # Example
///
/// ```rust
/// use cretoai_rbac::RoleChain;
///
/// let chain = RoleChain::new("use.Account")
///     .add("Member", &["get"])
///     .add("Admin", &["update", "delete"]);
///
/// assert_eq!(chain.roles()[1].permissions, vec!["get", "update", "delete"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChain {
    name: String,
    roles: Vec<Role>,
    /// Cumulative permissions of every role added so far
    permissions: Vec<String>,
}

impl RoleChain {
    /// Create an empty chain
    ///
    /// Name uniqueness is checked when the chain is indexed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Add a role extending the permissions of all previously added roles
    pub fn add(mut self, id: impl Into<String>, permissions: &[&str]) -> Self {
        self.push(id, permissions);
        self
    }

    /// Like [`RoleChain::add`], for building a chain in place
    ///
    /// Permissions already inherited are skipped. Repeats within
    /// `permissions` itself are kept so index construction can reject them.
    pub fn push(&mut self, id: impl Into<String>, permissions: &[&str]) -> &mut Self {
        let added: Vec<String> = permissions
            .iter()
            .filter(|p| !self.permissions.iter().any(|held| held.as_str() == **p))
            .map(|p| p.to_string())
            .collect();
        self.permissions.extend(added);
        self.roles.push(Role {
            id: id.into(),
            permissions: self.permissions.clone(),
        });
        self
    }

    /// Chain name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Roles in addition order, with effective permissions
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Permissions granted by the last role in the chain
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Number of roles in the chain
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the chain has no roles
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Flattened name (`{chain}.{role}`) of a role id in this chain
    pub fn flattened_name(&self, role_id: &str) -> String {
        format!("{}{}{}", self.name, ROLE_SEPARATOR, role_id)
    }
}

/// Returns a new chain to add roles which extend each other's permissions
pub fn chain(name: impl Into<String>) -> RoleChain {
    RoleChain::new(name)
}

/// Declarative form of a chain
///
/// Each role lists only the permissions it grants directly;
/// [`ChainDefinition::into_chain`] applies the inheritance.
///
/// ```rust
/// use cretoai_rbac::ChainDefinition;
///
/// let definition: ChainDefinition = serde_json::from_str(
///     r#"{"name": "auth", "roles": [
///         {"id": "Unauthenticated", "permissions": ["list"]},
///         {"id": "Authenticated", "permissions": ["create"]}
///     ]}"#,
/// ).unwrap();
///
/// let chain = definition.into_chain();
/// assert_eq!(chain.roles()[1].permissions, vec!["list", "create"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDefinition {
    /// Chain name
    pub name: String,

    /// Roles in inheritance order
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl ChainDefinition {
    /// Build the chain, replaying every declared role in order
    pub fn into_chain(self) -> RoleChain {
        let mut chain = RoleChain::new(self.name);
        for role in self.roles {
            let permissions: Vec<&str> = role.permissions.iter().map(String::as_str).collect();
            chain.push(role.id, &permissions);
        }
        chain
    }
}

impl From<ChainDefinition> for RoleChain {
    fn from(definition: ChainDefinition) -> Self {
        definition.into_chain()
    }
}
