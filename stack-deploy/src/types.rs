//! Domain types shared by the client and the reconciler.

use std::fmt;

use serde::Serialize;

/// Portainer environment (endpoint) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EndpointId(pub u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Swarm cluster identifier backing an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterId(pub String);

impl ClusterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stack as known to Portainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRef {
    pub id: u64,
    pub name: String,
}

/// The stack the caller wants to exist (or not exist).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDesired {
    pub name: String,
    /// Fully rendered stack file.
    pub content: String,
    pub delete_requested: bool,
    pub prune_requested: bool,
}

/// Portainer login.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
