use std::sync::Arc;

use jiff::Timestamp;
use uuid::Uuid;

use crate::config::DeployConfig;
use crate::error::{format_err_chain, ProvisionerError};
use crate::manifest::{sanitize_name, TemplateSpec};
use crate::orchestrate::Mode;
use crate::outcome::Outcome;
use crate::params::{self, ParameterSet};
use crate::poll::{poll_until, PollPolicy, Probe};
use crate::provider::{
    ChangeSetStatus, PreviewState, StackPhase, StackProvider, StackRequest, CAPABILITY_NAMED_IAM,
};
use crate::store::TemplateStore;
use crate::template;

/// Drives one template through stage → existence check → create (deploy
/// only) → change set → execute (deploy only).
///
/// Each driver owns the provider client for its template's region.
pub struct StackDriver {
    spec: TemplateSpec,
    stack_name: String,
    provider: Box<dyn StackProvider>,
    store: Arc<dyn TemplateStore>,
    poll: PollPolicy,
}

impl StackDriver {
    pub fn new(
        spec: TemplateSpec,
        config: &DeployConfig,
        provider: Box<dyn StackProvider>,
        store: Arc<dyn TemplateStore>,
    ) -> Self {
        Self {
            stack_name: config.stack_name(&spec),
            spec,
            provider,
            store,
            poll: config.poll,
        }
    }

    pub fn spec(&self) -> &TemplateSpec {
        &self.spec
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Run the template and fold every failure into `Outcome::Failed`.
    ///
    /// Never returns an error: one template failing must not stop the others.
    pub async fn run(&self, params: &ParameterSet, mode: Mode) -> Outcome {
        match self.try_run(params, mode).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = format_err_chain(&e);
                tracing::error!(stack = %self.stack_name, error = %error, "template failed");
                Outcome::Failed { error }
            }
        }
    }

    async fn try_run(
        &self,
        params: &ParameterSet,
        mode: Mode,
    ) -> Result<Outcome, ProvisionerError> {
        // 1. Stage
        let staged = self.store.stage(&self.spec.identifier).await?;

        // 2. Resolve parameters
        let declared = template::declared_parameters(&staged.body)?;
        let parameters = params::resolve(params, &declared);
        tracing::info!(
            stack = %self.stack_name,
            declared = declared.len(),
            resolved = ?parameters.iter().map(|p| p.key.as_str()).collect::<Vec<_>>(),
            "parameters resolved"
        );

        let request = StackRequest {
            stack_name: self.stack_name.clone(),
            template: staged.source,
            parameters,
            capabilities: vec![CAPABILITY_NAMED_IAM.to_string()],
        };

        // 3. Existence check
        match self.provider.describe_stack(&self.stack_name).await? {
            Some(status) => {
                tracing::info!(stack = %self.stack_name, status = %status.status, "stack exists");
            }
            None if mode.deploys() => self.create_stack(&request).await?,
            None => {
                tracing::info!(stack = %self.stack_name, "stack does not exist, skipping");
                return Ok(Outcome::NotFound {
                    stack_name: self.stack_name.clone(),
                });
            }
        }

        // 4. Change set
        let change_set_name = change_set_name(self.spec.stack_suffix(), mode);
        let preview = match self
            .provider
            .create_change_set(&request, &change_set_name)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    stack = %self.stack_name,
                    change_set = %change_set_name,
                    "change set requested"
                );
                self.wait_for_change_set(&change_set_name).await?
            }
            Err(ProvisionerError::ChangeSetFailed(reason)) => PreviewState::Failed(reason),
            Err(e) => PreviewState::Failed(format_err_chain(&e)),
        };

        let changes = match preview {
            PreviewState::Empty => {
                tracing::info!(stack = %self.stack_name, "change set is empty, nothing to do");
                return Ok(Outcome::NoChange);
            }
            PreviewState::Failed(reason) => {
                tracing::error!(stack = %self.stack_name, reason = %reason, "change set failed");
                return Ok(Outcome::Failed { error: reason });
            }
            PreviewState::Ready => {
                self.provider
                    .describe_change_set(&self.stack_name, &change_set_name)
                    .await?
            }
        };

        for change in &changes {
            tracing::info!(
                stack = %self.stack_name,
                action = %change.action,
                logical_id = %change.logical_resource_id,
                resource_type = %change.resource_type,
                replacement = change.replacement.as_deref().unwrap_or("-"),
                "planned change"
            );
        }

        if !mode.deploys() {
            return Ok(changes_outcome(changes));
        }

        // 5. Execute
        self.provider
            .execute_change_set(&self.stack_name, &change_set_name)
            .await
            .map_err(|e| e.with_stack(&self.stack_name))?;
        tracing::info!(stack = %self.stack_name, change_set = %change_set_name, "change set executing");

        self.wait_for_stack("stack update", ProvisionerError::ExecuteFailed)
            .await?;
        tracing::info!(stack = %self.stack_name, "stack updated");

        Ok(changes_outcome(changes))
    }

    async fn create_stack(&self, request: &StackRequest) -> Result<(), ProvisionerError> {
        self.provider
            .create_stack(request)
            .await
            .map_err(|e| e.with_stack(&self.stack_name))?;
        tracing::info!(stack = %self.stack_name, "create_stack started");

        self.wait_for_stack("stack creation", ProvisionerError::CreateFailed)
            .await?;
        tracing::info!(stack = %self.stack_name, "create_stack finished");
        Ok(())
    }

    /// Wait until the stack is stable. A failed or vanished stack becomes
    /// `fail(detail)`.
    async fn wait_for_stack(
        &self,
        what: &str,
        fail: fn(String) -> ProvisionerError,
    ) -> Result<(), ProvisionerError> {
        let this = self;
        poll_until(&self.poll, what, move || this.stack_probe(fail))
            .await
            .map_err(|e| e.with_stack(&self.stack_name))
    }

    async fn stack_probe(
        &self,
        fail: fn(String) -> ProvisionerError,
    ) -> Result<Probe<()>, ProvisionerError> {
        let Some(status) = self.provider.describe_stack(&self.stack_name).await? else {
            return Err(fail("stack no longer exists".to_string()));
        };

        match status.phase {
            StackPhase::Stable => Ok(Probe::Ready(())),
            StackPhase::InProgress => Ok(Probe::Pending),
            StackPhase::Failed => Err(fail(status.describe())),
        }
    }

    async fn wait_for_change_set(
        &self,
        change_set_name: &str,
    ) -> Result<PreviewState, ProvisionerError> {
        let this = self;
        poll_until(&self.poll, "change set", move || {
            this.change_set_probe(change_set_name)
        })
        .await
    }

    async fn change_set_probe(
        &self,
        change_set_name: &str,
    ) -> Result<Probe<PreviewState>, ProvisionerError> {
        let status = self
            .provider
            .change_set_status(&self.stack_name, change_set_name)
            .await?;

        Ok(match status {
            ChangeSetStatus::Pending => Probe::Pending,
            ChangeSetStatus::Ready => Probe::Ready(PreviewState::Ready),
            ChangeSetStatus::Empty => Probe::Ready(PreviewState::Empty),
            ChangeSetStatus::Failed(reason) => Probe::Ready(PreviewState::Failed(reason)),
        })
    }
}

fn changes_outcome(changes: Vec<crate::outcome::ResourceChange>) -> Outcome {
    if changes.is_empty() {
        Outcome::NoChange
    } else {
        Outcome::Changes { changes }
    }
}

/// `{suffix}-{mode}-{unix seconds}-{8 random hex}`.
///
/// The random tail keeps two runs within the same second apart.
pub fn change_set_name(suffix: &str, mode: Mode) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    sanitize_name(&format!(
        "{suffix}-{}-{}-{}",
        mode.as_str(),
        Timestamp::now().as_second(),
        &nonce[..8]
    ))
}
