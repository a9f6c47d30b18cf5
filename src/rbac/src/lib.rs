//! # CretoAI RBAC
//!
//! Role chains, a flattened permission index and a per-request authorizer.
//!
//! ## Features
//!
//! - **Role chains**: ordered roles where each role inherits every earlier
//!   role's permissions
//! - **Permission index**: immutable lookup maps keyed by flattened role
//!   names (`{chain}.{role}`), validated once at startup
//! - **Async-aware authorizer**: roles resolved in background tokio tasks,
//!   queries wait until resolution has finished
//! - **Thread-safe accumulation**: DashMap-backed role and error sets
//!
//! ## Example
//!
//! ```rust
//! use cretoai_rbac::{Index, RoleChain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = RoleChain::new("auth")
//!         .add("Unauthenticated", &["list"])
//!         .add("Authenticated", &["create"]);
//!     let account = RoleChain::new("use.Account")
//!         .add("Member", &["get"])
//!         .add("Admin", &["update", "delete"]);
//!
//!     let index = Index::new([auth, account])?;
//!
//!     let authorizer = index.authorizer(["auth.Authenticated"]);
//!     authorizer.add_async(|| async {
//!         Ok::<_, std::io::Error>(vec!["use.Account.Member".to_string()])
//!     });
//!
//!     authorizer.err().await?;
//!     assert!(authorizer.has_permission("get").await);
//!     assert!(authorizer.has_permission("list").await);
//!     assert!(!authorizer.has_permission("delete").await);
//!
//!     Ok(())
//! }
//! ```

pub mod authorizer;
pub mod chain;
pub mod error;
pub mod index;

// Re-export commonly used types
pub use authorizer::{Authorizer, AuthorizerConfig};
pub use chain::{chain, ChainDefinition, Role, RoleChain, ROLE_SEPARATOR};
pub use error::{RbacError, ResolutionError, Result};
pub use index::Index;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
