//! Per-request authorizer
//!
//! An [`Authorizer`] accumulates the roles held by a principal and answers
//! permission and role queries against an [`Index`]. Roles can be added
//! directly or through resolvers that run as tokio tasks.
//!
//! Every query first waits for all resolvers scheduled on the same
//! authorizer, so answers never reflect a partially resolved role set.
//!
//! # Example
//!
//! ```rust
//! use cretoai_rbac::{Authorizer, Index, RoleChain};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let index = Index::new([RoleChain::new("use.Account")
//!     .add("Member", &["get"])
//!     .add("Admin", &["update", "delete"])])
//! .unwrap();
//!
//! let authorizer = Authorizer::new(&index);
//! authorizer.add_async(|| async {
//!     // e.g. look the membership up remotely
//!     Ok::<_, std::io::Error>(vec!["use.Account.Member".to_string()])
//! });
//!
//! authorizer.err().await.unwrap();
//! assert!(authorizer.has_permission("get").await);
//! assert!(!authorizer.has_permission("update").await);
//! # }
//! ```

mod config;
mod pending;


pub use config::AuthorizerConfig;

use crate::error::{ResolutionError, Result};
use crate::index::Index;
use dashmap::DashSet;
use futures::FutureExt;
use pending::{PendingGuard, PendingTasks};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Accumulates roles and answers permission queries
///
/// Clones share the same role set, error set and pending tasks.
#[derive(Debug, Clone)]
pub struct Authorizer {
    /// Index this authorizer checks against
    index: Index,

    /// Held role names
    roles: Arc<DashSet<String>>,

    /// Messages of failed or rejected resolutions
    errors: Arc<DashSet<String>>,

    /// In-flight resolvers
    pending: PendingTasks,

    config: AuthorizerConfig,
}

impl Authorizer {
    /// Create an authorizer with no roles
    pub fn new(index: &Index) -> Self {
        Self::with_config(index, AuthorizerConfig::default())
    }

    /// Create an authorizer with no roles and a custom configuration
    pub fn with_config(index: &Index, config: AuthorizerConfig) -> Self {
        Self {
            index: index.clone(),
            roles: Arc::new(DashSet::new()),
            errors: Arc::new(DashSet::new()),
            pending: PendingTasks::new(),
            config,
        }
    }

    /// Directly adds one or more roles
    ///
    /// Roles are not checked against the index.
    pub fn add<I, S>(&self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            self.roles.insert(role.into());
        }
    }

    /// Adds the roles produced by an async resolver
    ///
    /// The resolver runs on its own tokio task and this call returns
    /// immediately. A failing resolver adds nothing and its error is
    /// reported by [`Authorizer::err`]. Returned roles unknown to the index
    /// are reported as "not allowed" and, unless the configuration says
    /// otherwise, still held.
    ///
    /// Outside of a tokio runtime nothing is scheduled and the failure is
    /// reported by [`Authorizer::err`].
    pub fn add_async<F, Fut, E>(&self, resolver: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<Vec<String>, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let Some(runtime) = self.runtime() else {
            return;
        };
        let task = ResolutionTask::begin(self);
        debug!(pending = self.pending.get(), "Scheduled async role resolution");

        runtime.spawn(async move {
            let outcome = AssertUnwindSafe(async move { resolver().await })
                .catch_unwind()
                .await;
            task.complete(outcome);
        });
    }

    /// Adds the roles produced by a blocking resolver
    ///
    /// Same contract as [`Authorizer::add_async`], with the resolver run on
    /// tokio's blocking thread pool.
    pub fn add_blocking<F, E>(&self, resolver: F)
    where
        F: FnOnce() -> std::result::Result<Vec<String>, E> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let Some(runtime) = self.runtime() else {
            return;
        };
        let task = ResolutionTask::begin(self);
        debug!(pending = self.pending.get(), "Scheduled blocking role resolution");

        runtime.spawn_blocking(move || {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(resolver));
            task.complete(outcome);
        });
    }

    /// Returns the combined error of every failed resolution, if any
    ///
    /// Waits for all scheduled resolvers first.
    pub async fn err(&self) -> Result<()> {
        self.pending.wait().await;

        let messages: Vec<String> = self.errors.iter().map(|m| m.key().clone()).collect();
        if messages.is_empty() {
            return Ok(());
        }
        Err(ResolutionError::new(messages).into())
    }

    /// Returns whether one of the held roles gives the permission
    ///
    /// Waits for all scheduled resolvers first.
    pub async fn has_permission(&self, permission: &str) -> bool {
        self.pending.wait().await;
        self.grants(permission)
    }

    /// Returns whether any of the permissions is given
    pub async fn has_any_permission(&self, permissions: &[&str]) -> bool {
        self.pending.wait().await;
        permissions.iter().any(|p| self.grants(p))
    }

    /// Returns whether every one of the permissions is given
    pub async fn has_all_permissions(&self, permissions: &[&str]) -> bool {
        self.pending.wait().await;
        permissions.iter().all(|p| self.grants(p))
    }

    /// Returns whether the flattened role is held
    ///
    /// Waits for all scheduled resolvers first.
    pub async fn has_role(&self, role: &str) -> bool {
        self.pending.wait().await;
        self.roles.contains(role)
    }

    /// Sorted snapshot of the held roles
    ///
    /// Waits for all scheduled resolvers first.
    pub async fn roles(&self) -> Vec<String> {
        self.pending.wait().await;
        let mut roles: Vec<String> = self.roles.iter().map(|r| r.key().clone()).collect();
        roles.sort();
        roles
    }

    /// Number of resolvers still running
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Index this authorizer checks against
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Active configuration
    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    fn runtime(&self) -> Option<Handle> {
        match Handle::try_current() {
            Ok(handle) => Some(handle),
            Err(e) => {
                self.record_error(format!("role resolution not scheduled: {}", e));
                None
            }
        }
    }

    fn grants(&self, permission: &str) -> bool {
        self.index
            .roles_with_permission(permission)
            .is_some_and(|granting| granting.iter().any(|role| self.roles.contains(role)))
    }

    fn complete<E: fmt::Display>(
        &self,
        outcome: std::thread::Result<std::result::Result<Vec<String>, E>>,
    ) {
        match outcome {
            Ok(Ok(roles)) => self.accept(roles),
            Ok(Err(e)) => self.record_error(e.to_string()),
            Err(panic) => self.record_error(format!(
                "role resolver panicked: {}",
                panic_message(panic.as_ref())
            )),
        }
    }

    fn accept(&self, roles: Vec<String>) {
        let mut held = Vec::with_capacity(roles.len());
        for role in roles {
            if self.index.has_role(&role) {
                held.push(role);
                continue;
            }
            self.record_error(format!("role {} not allowed", role));
            if self.config.hold_unknown_roles {
                held.push(role);
            }
        }
        debug!(roles = ?held, "Resolved roles");
        self.add(held);
    }

    fn record_error(&self, message: String) {
        if self.config.log_resolution_errors {
            warn!(error = %message, "Role resolution failed");
        }
        self.errors.insert(message);
    }
}

/// A scheduled resolution
///
/// Holds a pending slot until dropped. Dropping it before
/// [`ResolutionTask::complete`] ran, e.g. when the runtime shuts down, records
/// the resolution as cancelled.
struct ResolutionTask {
    authorizer: Authorizer,
    completed: bool,
    _slot: PendingGuard,
}

impl ResolutionTask {
    fn begin(authorizer: &Authorizer) -> Self {
        Self {
            _slot: authorizer.pending.begin(),
            authorizer: authorizer.clone(),
            completed: false,
        }
    }

    fn complete<E: fmt::Display>(
        mut self,
        outcome: std::thread::Result<std::result::Result<Vec<String>, E>>,
    ) {
        self.authorizer.complete(outcome);
        self.completed = true;
    }
}

impl Drop for ResolutionTask {
    // Runs before `_slot` is released, so waiters see the error.
    fn drop(&mut self) {
        if !self.completed {
            self.authorizer
                .record_error("role resolution cancelled".to_string());
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
