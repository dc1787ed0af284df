use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, ChangeSetType, Parameter as CfnParameter};

use crate::error::{format_err_chain, ProvisionerError};
use crate::outcome::ResourceChange;
use crate::params::Parameter;
use crate::provider::{BoxFuture, ChangeSetStatus, StackProvider, StackRequest, StackStatus};
use crate::store::TemplateSource;

/// `StackProvider` backed by the CloudFormation API in one region.
#[derive(Clone)]
pub struct CloudFormationProvider {
    client: Client,
}

impl CloudFormationProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a provider for `region` from the default AWS config.
    pub async fn for_region(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

impl StackProvider for CloudFormationProvider {
    fn describe_stack<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Option<StackStatus>, ProvisionerError>> {
        Box::pin(async move {
            let resp = match self
                .client
                .describe_stacks()
                .stack_name(stack_name)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let err = e.into_service_error();
                    if is_missing_stack(err.code(), err.message()) {
                        return Ok(None);
                    }
                    return Err(ProvisionerError::Aws(format_err_chain(&err)));
                }
            };

            let Some(stack) = resp.stacks().first() else {
                return Ok(None);
            };
            let code = stack
                .stack_status()
                .map(|s| s.as_str())
                .unwrap_or("UNKNOWN");
            if code == "DELETE_COMPLETE" {
                return Ok(None);
            }

            Ok(Some(StackStatus::from_code(
                code,
                stack.stack_status_reason().map(String::from),
            )))
        })
    }

    fn create_stack<'a>(
        &'a self,
        request: &'a StackRequest,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            let builder = self
                .client
                .create_stack()
                .stack_name(&request.stack_name)
                .set_parameters(Some(cfn_parameters(&request.parameters)))
                .set_capabilities(Some(capabilities(&request.capabilities)));

            let builder = match &request.template {
                TemplateSource::Body(body) => builder.template_body(body),
                TemplateSource::Url(url) => builder.template_url(url),
            };

            let resp = builder
                .send()
                .await
                .map_err(|e| ProvisionerError::CreateFailed(format_err_chain(&e)))?;

            tracing::debug!(
                stack = %request.stack_name,
                stack_id = resp.stack_id().unwrap_or_default(),
                "CreateStack accepted"
            );
            Ok(())
        })
    }

    fn create_change_set<'a>(
        &'a self,
        request: &'a StackRequest,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            let builder = self
                .client
                .create_change_set()
                .stack_name(&request.stack_name)
                .change_set_name(change_set_name)
                .change_set_type(ChangeSetType::Update)
                .use_previous_template(false)
                .set_parameters(Some(cfn_parameters(&request.parameters)))
                .set_capabilities(Some(capabilities(&request.capabilities)));

            let builder = match &request.template {
                TemplateSource::Body(body) => builder.template_body(body),
                TemplateSource::Url(url) => builder.template_url(url),
            };

            let resp = builder.send().await.map_err(|e| {
                let err = e.into_service_error();
                ProvisionerError::ChangeSetFailed(
                    err.message()
                        .map(String::from)
                        .unwrap_or_else(|| format_err_chain(&err)),
                )
            })?;

            tracing::debug!(
                stack = %request.stack_name,
                change_set_id = resp.id().unwrap_or_default(),
                "CreateChangeSet accepted"
            );
            Ok(())
        })
    }

    fn change_set_status<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<ChangeSetStatus, ProvisionerError>> {
        Box::pin(async move {
            let resp = self
                .client
                .describe_change_set()
                .stack_name(stack_name)
                .change_set_name(change_set_name)
                .send()
                .await
                .map_err(|e| ProvisionerError::ChangeSetFailed(format_err_chain(&e)))?;

            Ok(classify_change_set(
                resp.status().map(|s| s.as_str()).unwrap_or_default(),
                resp.status_reason().unwrap_or_default(),
            ))
        })
    }

    fn describe_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceChange>, ProvisionerError>> {
        Box::pin(async move {
            let mut changes = Vec::new();
            let mut next_token: Option<String> = None;

            loop {
                let mut req = self
                    .client
                    .describe_change_set()
                    .stack_name(stack_name)
                    .change_set_name(change_set_name);
                if let Some(token) = &next_token {
                    req = req.next_token(token);
                }

                let resp = req
                    .send()
                    .await
                    .map_err(|e| ProvisionerError::ChangeSetFailed(format_err_chain(&e)))?;

                for change in resp.changes() {
                    if let Some(rc) = change.resource_change() {
                        changes.push(ResourceChange {
                            action: rc.action().map(|a| a.as_str()).unwrap_or_default().to_string(),
                            logical_resource_id: rc.logical_resource_id().unwrap_or_default().to_string(),
                            physical_resource_id: rc.physical_resource_id().map(String::from),
                            resource_type: rc.resource_type().unwrap_or_default().to_string(),
                            replacement: rc.replacement().map(|r| r.as_str().to_string()),
                            scope: rc.scope().iter().map(|s| s.as_str().to_string()).collect(),
                        });
                    }
                }

                match resp.next_token() {
                    Some(token) => next_token = Some(token.to_string()),
                    None => break,
                }
            }

            Ok(changes)
        })
    }

    fn execute_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            self.client
                .execute_change_set()
                .stack_name(stack_name)
                .change_set_name(change_set_name)
                .send()
                .await
                .map_err(|e| ProvisionerError::ExecuteFailed(format_err_chain(&e)))?;
            Ok(())
        })
    }
}

fn cfn_parameters(parameters: &[Parameter]) -> Vec<CfnParameter> {
    parameters
        .iter()
        .map(|p| {
            CfnParameter::builder()
                .parameter_key(&p.key)
                .parameter_value(&p.value)
                .build()
        })
        .collect()
}

fn capabilities(names: &[String]) -> Vec<Capability> {
    names.iter().map(|c| Capability::from(c.as_str())).collect()
}

/// DescribeStacks reports an unknown stack name as a `ValidationError`
/// ("Stack with id X does not exist") rather than an empty list.
pub fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError") && message.is_some_and(|m| m.contains("does not exist"))
}

/// CloudFormation marks a change set without differences as `FAILED`; only
/// the status reason tells it apart from a real failure.
pub fn is_empty_change_set(reason: &str) -> bool {
    reason.contains("didn't contain changes") || reason.contains("No updates are to be performed")
}

pub fn classify_change_set(status: &str, reason: &str) -> ChangeSetStatus {
    match status {
        "CREATE_COMPLETE" => ChangeSetStatus::Ready,
        "CREATE_PENDING" | "CREATE_IN_PROGRESS" => ChangeSetStatus::Pending,
        "FAILED" if is_empty_change_set(reason) => ChangeSetStatus::Empty,
        "FAILED" if reason.is_empty() => ChangeSetStatus::Failed("change set failed".to_string()),
        "FAILED" => ChangeSetStatus::Failed(reason.to_string()),
        other => ChangeSetStatus::Failed(format!("unexpected change set status {other:?}")),
    }
}
