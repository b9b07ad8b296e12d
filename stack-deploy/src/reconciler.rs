//! Stack reconciler - turns a desired stack and the live inventory into
//! exactly one create, update or delete call.

use tracing::info;

use crate::client::StackApi;
use crate::error::Result;
use crate::types::{Credentials, EndpointId, StackDesired, StackRef};

/// The single corrective action for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Update { id: u64 },
    Delete { id: u64 },
}

/// What a reconcile run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(StackRef),
    Updated(StackRef),
    Deleted { id: u64, name: String },
}

/// Decide the action for `desired` given the current inventory.
///
/// The first stack whose name matches wins; duplicate names are not
/// disambiguated.
pub fn plan(inventory: &[StackRef], desired: &StackDesired) -> Action {
    match inventory.iter().find(|stack| stack.name == desired.name) {
        None => Action::Create,
        Some(existing) if desired.delete_requested => Action::Delete { id: existing.id },
        Some(existing) => Action::Update { id: existing.id },
    }
}

/// Reconciles one stack against the control plane behind `A`.
pub struct StackReconciler<A> {
    api: A,
}

impl<A: StackApi> StackReconciler<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Authenticate, fetch the inventory and dispatch the planned action.
    pub async fn reconcile(
        &mut self,
        credentials: &Credentials,
        endpoint: EndpointId,
        desired: &StackDesired,
    ) -> Result<Outcome> {
        self.api.authenticate(credentials).await?;

        info!(%endpoint, "Fetching current stack inventory");
        let inventory = self.api.list_stacks(endpoint).await?;

        match plan(&inventory, desired) {
            Action::Create => {
                info!(stack = %desired.name, %endpoint, "Creating new stack");
                let stack = self
                    .api
                    .create_stack(endpoint, &desired.name, &desired.content)
                    .await?;
                Ok(Outcome::Created(stack))
            }
            Action::Update { id } => {
                info!(
                    stack = %desired.name,
                    id,
                    prune = desired.prune_requested,
                    "Updating existing stack"
                );
                let stack = self
                    .api
                    .update_stack(id, endpoint, &desired.content, desired.prune_requested)
                    .await?;
                Ok(Outcome::Updated(stack))
            }
            Action::Delete { id } => {
                info!(stack = %desired.name, id, "Deleting stack");
                self.api.delete_stack(id, endpoint).await?;
                Ok(Outcome::Deleted {
                    id,
                    name: desired.name.clone(),
                })
            }
        }
    }
}
