//! stack-deploy: deploy a single stack to Portainer.
//!
//! Reads the stack file (optionally rendering it), then creates, updates or
//! deletes the named stack on the configured endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stack_deploy::{Args, DeployConfig, Outcome, PortainerClient, StackReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stack_deploy=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = DeployConfig::from_args(args).context("Invalid configuration")?;

    let client =
        PortainerClient::new(config.portainer.url.clone()).context("Invalid Portainer URL")?;
    info!(
        url = %client.base_url(),
        endpoint = %config.portainer.endpoint,
        stack = %config.stack.name,
        "Starting stack deployment"
    );
    let mut reconciler = StackReconciler::new(client);

    let outcome = reconciler
        .reconcile(
            &config.portainer.credentials,
            config.portainer.endpoint,
            &config.stack,
        )
        .await
        .with_context(|| format!("Failed to deploy stack {}", config.stack.name))?;

    match outcome {
        Outcome::Created(stack) => info!(id = stack.id, name = %stack.name, "Stack created"),
        Outcome::Updated(stack) => info!(id = stack.id, name = %stack.name, "Stack updated"),
        Outcome::Deleted { id, name } => info!(id, %name, "Stack deleted"),
    }

    Ok(())
}
