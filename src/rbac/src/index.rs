//! Permission index
//!
//! Flattens role chains into three lookup maps:
//!
//! - permission → flattened role names granting it
//! - chain name → role ids defined in the chain
//! - flattened role name → permissions it grants
//!
//! The maps are immutable once built and shared by every [`Authorizer`]
//! created from the index.

use crate::authorizer::{Authorizer, AuthorizerConfig};
use crate::chain::RoleChain;
use crate::error::{RbacError, Result};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

type SetMap = HashMap<String, HashSet<String>>;

#[derive(Debug, Default)]
struct Maps {
    permission_to_roles: SetMap,
    chain_to_role_ids: SetMap,
    role_to_permissions: SetMap,
}

/// A role-based access controller made up of role chains
///
/// Roles are flattened to `{chainName}.{roleId}`. Cloning is cheap and
/// shares the underlying maps.
///
/// # Example
///
/// ```rust
/// use cretoai_rbac::{Index, RoleChain};
///
/// let account = RoleChain::new("use.Account")
///     .add("Member", &["get"])
///     .add("Admin", &["update", "delete"]);
///
/// let index = Index::new([account]).unwrap();
/// assert!(index.chain_has_role_id("use.Account", "Admin"));
/// assert!(index.has_role("use.Account.Member"));
/// ```
#[derive(Debug, Clone)]
pub struct Index {
    maps: Arc<Maps>,
}

impl Index {
    /// Build an index from completed role chains
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No chains are given
    /// - Two roles flatten to the same name
    /// - A role lists the same permission twice
    pub fn new<I>(chains: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<RoleChain>,
    {
        let maps = Self::build(chains).map_err(|e| {
            warn!(error = %e, "Rejected role chain configuration");
            e
        })?;

        debug!(
            chains = maps.chain_to_role_ids.len(),
            roles = maps.role_to_permissions.len(),
            permissions = maps.permission_to_roles.len(),
            "Built permission index"
        );

        Ok(Self {
            maps: Arc::new(maps),
        })
    }

    fn build<I>(chains: I) -> Result<Maps>
    where
        I: IntoIterator,
        I::Item: Borrow<RoleChain>,
    {
        let mut maps = Maps::default();
        let mut seen_chain = false;

        for chain in chains {
            let chain = chain.borrow();
            seen_chain = true;

            let role_ids = maps
                .chain_to_role_ids
                .entry(chain.name().to_string())
                .or_default();

            for role in chain.roles() {
                role_ids.insert(role.id.clone());

                let role_name = chain.flattened_name(&role.id);
                if maps.role_to_permissions.contains_key(&role_name) {
                    return Err(RbacError::DuplicateRole(role_name));
                }

                let mut granted = HashSet::with_capacity(role.permissions.len());
                for permission in &role.permissions {
                    if !granted.insert(permission.clone()) {
                        return Err(RbacError::DuplicatePermission {
                            permission: permission.clone(),
                            role: role_name,
                        });
                    }
                    maps.permission_to_roles
                        .entry(permission.clone())
                        .or_default()
                        .insert(role_name.clone());
                }
                maps.role_to_permissions.insert(role_name, granted);
            }
        }

        if !seen_chain {
            return Err(RbacError::NoRoleChains);
        }

        Ok(maps)
    }

    /// Returns whether the role id exists in the given chain
    ///
    /// Role ids of chains sharing a name are merged.
    pub fn chain_has_role_id(&self, chain: &str, role_id: &str) -> bool {
        self.maps
            .chain_to_role_ids
            .get(chain)
            .is_some_and(|ids| ids.contains(role_id))
    }

    /// Returns whether a flattened role name is defined
    pub fn has_role(&self, role: &str) -> bool {
        self.maps.role_to_permissions.contains_key(role)
    }

    /// Permissions granted by a flattened role name
    pub fn role_permissions(&self, role: &str) -> Option<&HashSet<String>> {
        self.maps.role_to_permissions.get(role)
    }

    /// Flattened role names granting a permission
    pub fn roles_with_permission(&self, permission: &str) -> Option<&HashSet<String>> {
        self.maps.permission_to_roles.get(permission)
    }

    /// Names of the indexed chains
    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.maps.chain_to_role_ids.keys().map(String::as_str)
    }

    /// Number of flattened roles
    pub fn role_count(&self) -> usize {
        self.maps.role_to_permissions.len()
    }

    /// Number of distinct permissions
    pub fn permission_count(&self) -> usize {
        self.maps.permission_to_roles.len()
    }

    /// Returns an authorizer holding the given roles
    ///
    /// Roles are not validated; unknown ones grant nothing.
    pub fn authorizer<I, S>(&self, roles: I) -> Authorizer
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authorizer = Authorizer::new(self);
        authorizer.add(roles);
        authorizer
    }

    /// Like [`Index::authorizer`] with a custom configuration
    pub fn authorizer_with_config<I, S>(&self, config: AuthorizerConfig, roles: I) -> Authorizer
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authorizer = Authorizer::with_config(self, config);
        authorizer.add(roles);
        authorizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_chain() -> RoleChain {
        RoleChain::new("use.Account")
            .add("Member", &["get"])
            .add("Admin", &["update", "delete"])
    }

    #[test]
    fn test_no_chains() {
        let err = Index::new(Vec::<RoleChain>::new()).unwrap_err();
        assert_eq!(err, RbacError::NoRoleChains);
    }

    #[test]
    fn test_empty_chain_is_accepted() {
        let index = Index::new([RoleChain::new("empty")]).unwrap();

        assert_eq!(index.role_count(), 0);
        assert_eq!(index.chains().collect::<Vec<_>>(), vec!["empty"]);
        assert!(!index.chain_has_role_id("empty", "Anything"));
    }

    #[test]
    fn test_lookup_maps() {
        let index = Index::new([account_chain()]).unwrap();

        let admin = index.role_permissions("use.Account.Admin").unwrap();
        assert_eq!(admin.len(), 3);
        assert!(admin.contains("get"));

        let granting = index.roles_with_permission("get").unwrap();
        assert!(granting.contains("use.Account.Member"));
        assert!(granting.contains("use.Account.Admin"));

        let granting = index.roles_with_permission("delete").unwrap();
        assert_eq!(granting.len(), 1);

        assert!(index.roles_with_permission("unknown").is_none());
        assert_eq!(index.permission_count(), 3);
    }

    #[test]
    fn test_duplicate_role_across_chains() {
        let first = RoleChain::new("auth").add("Admin", &["a"]);
        let second = RoleChain::new("auth").add("Admin", &["b"]);

        let err = Index::new([first, second]).unwrap_err();
        assert_eq!(err, RbacError::DuplicateRole("auth.Admin".to_string()));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_duplicate_role_within_chain() {
        let chain = RoleChain::new("auth").add("Admin", &["a"]).add("Admin", &["b"]);

        assert!(matches!(
            Index::new([chain]),
            Err(RbacError::DuplicateRole(name)) if name == "auth.Admin"
        ));
    }

    #[test]
    fn test_dotted_names_collide_after_flattening() {
        let first = RoleChain::new("use.Account").add("Member", &["get"]);
        let second = RoleChain::new("use").add("Account.Member", &["list"]);

        assert!(matches!(
            Index::new([first, second]),
            Err(RbacError::DuplicateRole(_))
        ));
    }

    #[test]
    fn test_literal_duplicate_permission() {
        let chain = RoleChain::new("auth").add("Viewer", &["list", "list"]);

        let err = Index::new([chain]).unwrap_err();
        assert_eq!(
            err,
            RbacError::DuplicatePermission {
                permission: "list".to_string(),
                role: "auth.Viewer".to_string(),
            }
        );
    }

    #[test]
    fn test_redeclared_inherited_permission_is_accepted() {
        let chain = RoleChain::new("auth").add("Viewer", &["list"]).add("Editor", &["list"]);

        let index = Index::new([chain]).unwrap();
        assert_eq!(index.role_permissions("auth.Editor").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_role_objects_in_slice() {
        let chain = account_chain();
        assert!(matches!(
            Index::new([&chain, &chain]),
            Err(RbacError::DuplicateRole(_))
        ));
    }

    #[test]
    fn test_borrowed_chains() {
        let chains = vec![account_chain(), RoleChain::new("auth").add("Guest", &["list"])];
        let index = Index::new(&chains).unwrap();

        assert!(index.chain_has_role_id("auth", "Guest"));
        assert!(index.chain_has_role_id("use.Account", "Member"));
        assert!(!index.chain_has_role_id("auth", "Member"));
        assert!(!index.chain_has_role_id("missing", "Guest"));
    }

    #[test]
    fn test_same_chain_name_keeps_all_role_ids() {
        let first = RoleChain::new("auth").add("Guest", &["list"]);
        let second = RoleChain::new("auth").add("User", &["create"]);

        let index = Index::new([first, second]).unwrap();
        assert!(index.chain_has_role_id("auth", "Guest"));
        assert!(index.chain_has_role_id("auth", "User"));
    }
}
