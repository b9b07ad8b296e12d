//! Portainer API client.
//!
//! `PortainerClient` owns one HTTP session against the Portainer control
//! plane. After `authenticate` succeeds the JWT is kept in a [`Session`] and
//! attached by [`PortainerClient::request`], the single builder every
//! operation goes through. Before that, no `Authorization` header is sent.

pub mod wire;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AuthError, Error, Result};
use crate::types::{ClusterId, Credentials, EndpointId, StackRef};
use wire::{
    AuthRequest, AuthResponse, CreateStackQuery, CreateStackRequest, DeleteStackQuery,
    EndpointQuery, ListStacksQuery, METHOD_STRING, PortainerStack, SwarmResponse, TYPE_SWARM,
    UpdateStackRequest,
};

/// Path every API call is issued under.
pub const API_ROOT: &str = "/api/";

/// Stack operations the reconciler needs from the control plane.
#[async_trait]
pub trait StackApi: Send + Sync {
    /// Log in and keep the bearer token for all later calls.
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()>;

    /// List stacks deployed on the endpoint's swarm.
    async fn list_stacks(&self, endpoint: EndpointId) -> Result<Vec<StackRef>>;

    /// Create a swarm stack from inline file content.
    async fn create_stack(
        &self,
        endpoint: EndpointId,
        name: &str,
        content: &str,
    ) -> Result<StackRef>;

    /// Redeploy an existing stack with new content.
    async fn update_stack(
        &self,
        id: u64,
        endpoint: EndpointId,
        content: &str,
        prune: bool,
    ) -> Result<StackRef>;

    /// Remove a stack.
    async fn delete_stack(&self, id: u64, endpoint: EndpointId) -> Result<()>;
}

/// Bearer token obtained from `/api/auth`.
#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// Replace whatever path `url` carries with the API root.
///
/// Userinfo is stripped: reqwest would turn it into a second, `Basic`
/// `Authorization` header next to the bearer token.
pub fn normalize_base_url(mut url: Url) -> Result<Url> {
    if url.cannot_be_a_base() {
        return Err(Error::InvalidBaseUrl(url.to_string()));
    }
    url.set_username("")
        .and_then(|_| url.set_password(None))
        .map_err(|_| Error::InvalidBaseUrl(format!("{}: URL without a host", url.scheme())))?;
    url.set_path(API_ROOT);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// HTTP client for the Portainer REST API.
#[derive(Debug)]
pub struct PortainerClient {
    http: reqwest::Client,
    base: Url,
    session: Option<Session>,
}

impl PortainerClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let base = normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("stack-deploy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            session: None,
        })
    }

    /// Normalized API root all requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Build a request for `path` (relative to the API root), attaching the
    /// bearer token when a session exists.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base
            .join(path)
            .map_err(|e| Error::InvalidBaseUrl(format!("{}{}: {}", self.base, path, e)))?;
        debug!(%method, %url, "Portainer request");

        let builder = self.http.request(method, url);
        Ok(match &self.session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        })
    }

    /// Send and turn non-2xx replies into `Error::Api`.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<body unreadable: {}>", e));
        debug!(status = status.as_u16(), %body, "Portainer request failed");
        Err(Error::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &'static str) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| Error::Decode { what, source })
    }

    /// Look up the swarm ID behind an endpoint.
    pub async fn resolve_cluster_id(&self, endpoint: EndpointId) -> Result<ClusterId> {
        let request = self.request(Method::GET, &format!("endpoints/{}/docker/swarm", endpoint))?;
        let response = match self.send(request).await {
            Ok(response) => response,
            // Docker answers 404 (no swarm) or 503 (not a swarm manager)
            Err(Error::Api {
                status: 404 | 503, ..
            }) => return Err(Error::NotFound { endpoint }),
            Err(e) => return Err(e),
        };

        let swarm: SwarmResponse = Self::decode(response, "swarm").await?;
        if swarm.id.is_empty() {
            return Err(Error::NotFound { endpoint });
        }
        debug!(%endpoint, swarm_id = %swarm.id, "Resolved swarm ID");
        Ok(ClusterId(swarm.id))
    }
}

#[async_trait]
impl StackApi for PortainerClient {
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        info!(username = %credentials.username, url = %self.base, "Authenticating");

        let request = self.request(Method::POST, "auth")?.json(&AuthRequest {
            username: &credentials.username,
            password: &credentials.password,
        });
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(Error::Api { status, body }) => {
                return Err(AuthError::Rejected { status, body }.into());
            }
            Err(Error::Transport(e)) => return Err(AuthError::Unreachable(e).into()),
            Err(e) => return Err(e),
        };

        // Anything short of a token counts against authentication
        let body = response.text().await.map_err(AuthError::Unreachable)?;
        let auth: AuthResponse = serde_json::from_str(&body).map_err(AuthError::Malformed)?;
        if auth.jwt.is_empty() {
            return Err(AuthError::EmptyToken.into());
        }
        self.session = Some(Session { token: auth.jwt });
        Ok(())
    }

    async fn list_stacks(&self, endpoint: EndpointId) -> Result<Vec<StackRef>> {
        let cluster_id = self.resolve_cluster_id(endpoint).await?;
        let filters = json!({ "SwarmId": cluster_id.as_str() }).to_string();

        let request = self
            .request(Method::GET, "stacks")?
            .query(&ListStacksQuery { filters });
        let response = self.send(request).await?;
        let stacks: Vec<PortainerStack> = Self::decode(response, "stack list").await?;

        debug!(%endpoint, count = stacks.len(), "Listed stacks");
        Ok(stacks.into_iter().map(StackRef::from).collect())
    }

    async fn create_stack(
        &self,
        endpoint: EndpointId,
        name: &str,
        content: &str,
    ) -> Result<StackRef> {
        let cluster_id = self.resolve_cluster_id(endpoint).await?;

        let request = self
            .request(Method::POST, "stacks")?
            .query(&CreateStackQuery {
                endpoint_id: endpoint,
                method: METHOD_STRING,
                stack_type: TYPE_SWARM,
            })
            .json(&CreateStackRequest {
                name,
                stack_file_content: content,
                swarm_id: cluster_id.as_str(),
            });
        let response = self.send(request).await?;
        let stack: PortainerStack = Self::decode(response, "create stack").await?;
        Ok(stack.into())
    }

    async fn update_stack(
        &self,
        id: u64,
        endpoint: EndpointId,
        content: &str,
        prune: bool,
    ) -> Result<StackRef> {
        let request = self
            .request(Method::PUT, &format!("stacks/{}", id))?
            .query(&EndpointQuery {
                endpoint_id: endpoint,
            })
            .json(&UpdateStackRequest {
                stack_file_content: content,
                prune,
            });
        let response = self.send(request).await?;
        let stack: PortainerStack = Self::decode(response, "update stack").await?;
        Ok(stack.into())
    }

    async fn delete_stack(&self, id: u64, endpoint: EndpointId) -> Result<()> {
        let request = self
            .request(Method::DELETE, &format!("stacks/{}", id))?
            .query(&DeleteStackQuery {
                endpoint_id: endpoint,
                external: true,
            });
        self.send(request).await?;
        Ok(())
    }
}
