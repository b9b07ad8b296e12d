//! Request and response schemas for the Portainer REST API.
//!
//! Field names follow Portainer's JSON exactly; responses ignore any
//! additional fields Portainer sends along.

use serde::{Deserialize, Serialize};

use crate::types::{EndpointId, StackRef};

/// Stack deployment method: compose file passed inline as a string.
pub const METHOD_STRING: &str = "string";

/// Stack type: docker swarm stack.
pub const TYPE_SWARM: u8 = 1;

#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
}

#[derive(Debug, Deserialize)]
pub struct SwarmResponse {
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PortainerStack {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
}

impl From<PortainerStack> for StackRef {
    fn from(stack: PortainerStack) -> Self {
        StackRef {
            id: stack.id,
            name: stack.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListStacksQuery {
    /// JSON-encoded `{"SwarmId": "<id>"}`.
    pub filters: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStackQuery {
    pub endpoint_id: EndpointId,
    pub method: &'static str,
    #[serde(rename = "type")]
    pub stack_type: u8,
}

#[derive(Debug, Serialize)]
pub struct CreateStackRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "stackFileContent")]
    pub stack_file_content: &'a str,
    #[serde(rename = "swarmID")]
    pub swarm_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointQuery {
    pub endpoint_id: EndpointId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStackQuery {
    pub endpoint_id: EndpointId,
    pub external: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateStackRequest<'a> {
    #[serde(rename = "stackFileContent")]
    pub stack_file_content: &'a str,
    pub prune: bool,
}
