//! stack-deploy: reconcile a stack file against a Portainer control plane.
//!
//! A run authenticates, lists the stacks on the endpoint's swarm, and then
//! issues exactly one of create / update / delete for the named stack.
//!
//! # Example
//! ```ignore
//! use stack_deploy::{Credentials, EndpointId, PortainerClient, StackDesired, StackReconciler};
//!
//! let client = PortainerClient::new("https://portainer.example.com".parse()?)?;
//! let mut reconciler = StackReconciler::new(client);
//! let outcome = reconciler
//!     .reconcile(&Credentials::new("admin", "secret"), EndpointId(1), &desired)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod template;
pub mod types;

// Re-export commonly used types at crate root
pub use client::{PortainerClient, StackApi};
pub use config::{Args, ConfigError, DeployConfig};
pub use error::{AuthError, Error, Result};
pub use reconciler::{Action, Outcome, StackReconciler, plan};
pub use types::{ClusterId, Credentials, EndpointId, StackDesired, StackRef};
