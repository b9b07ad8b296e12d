//! Command line / environment configuration.
//!
//! Every flag can also be supplied through an environment variable so the
//! binary can run unchanged as a CI step.

use std::path::PathBuf;

use clap::Parser;
use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::template::TemplateRenderer;
use crate::types::{Credentials, EndpointId, StackDesired};

/// Deploy a stack to Portainer
#[derive(Parser, Debug)]
#[command(name = "stack-deploy", version, about)]
pub struct Args {
    /// Portainer base URL; any path is replaced by /api/
    #[arg(long, env = "PORTAINER_URL")]
    pub portainer_url: Url,

    /// Portainer username
    #[arg(long, env = "PORTAINER_USERNAME")]
    pub portainer_username: String,

    /// Portainer password
    #[arg(long, env = "PORTAINER_PASSWORD", hide_env_values = true)]
    pub portainer_password: String,

    /// Portainer endpoint (environment) ID
    #[arg(long, env = "PORTAINER_ENDPOINT")]
    pub portainer_endpoint: u64,

    /// Stack name
    #[arg(long, env = "STACK_NAME")]
    pub name: String,

    /// Path to the stack file
    #[arg(long, env = "STACK_FILE", required_unless_present = "delete")]
    pub file: Option<PathBuf>,

    /// Delete the stack instead of creating or updating it
    #[arg(long, env = "STACK_DELETE")]
    pub delete: bool,

    /// Remove services no longer present in the stack file on update
    #[arg(long, env = "STACK_PRUNE")]
    pub prune: bool,

    /// JSON object of template variables; enables rendering of the stack file
    #[arg(long, env = "TEMPLATE_VARIABLES")]
    pub template_variables: Option<String>,
}

/// Errors raised while building a [`DeployConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read stack file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template variables must be a JSON object: {0}")]
    InvalidVariables(String),

    #[error("failed to render stack file: {0}")]
    Template(#[from] minijinja::Error),
}

/// Connection settings for the Portainer API.
#[derive(Debug, Clone)]
pub struct PortainerConfig {
    pub url: Url,
    pub credentials: Credentials,
    pub endpoint: EndpointId,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub portainer: PortainerConfig,
    pub stack: StackDesired,
}

impl DeployConfig {
    /// Read the stack file and render it when template variables are set.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let variables = args
            .template_variables
            .as_deref()
            .map(parse_variables)
            .transpose()?;

        let content = match &args.file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
                    path: path.clone(),
                    source,
                })?;
                match &variables {
                    Some(vars) => {
                        debug!(path = %path.display(), count = vars.len(), "Rendering stack file");
                        TemplateRenderer::new().render(&raw, vars)?
                    }
                    None => raw,
                }
            }
            None => String::new(),
        };

        Ok(Self {
            portainer: PortainerConfig {
                url: args.portainer_url,
                credentials: Credentials::new(args.portainer_username, args.portainer_password),
                endpoint: EndpointId(args.portainer_endpoint),
            },
            stack: StackDesired {
                name: args.name,
                content,
                delete_requested: args.delete,
                prune_requested: args.prune,
            },
        })
    }
}

fn parse_variables(raw: &str) -> Result<Map<String, Value>, ConfigError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ConfigError::InvalidVariables(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(ConfigError::InvalidVariables(e.to_string())),
    }
}
