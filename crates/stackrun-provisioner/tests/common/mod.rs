//! In-memory provider and template store for driver and orchestrator tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stackrun_provisioner::provider::{
    BoxFuture, ChangeSetStatus, StackProvider, StackRequest, StackStatus,
};
use stackrun_provisioner::store::{StagedTemplate, TemplateSource, TemplateStore};
use stackrun_provisioner::{DeployConfig, PollPolicy, ProvisionerError, ResourceChange};

pub const VPC_TEMPLATE: &str = r#"
AWSTemplateFormatVersion: "2010-09-09"
Parameters:
  VpcCidr:
    Type: String
  Env:
    Type: String
  Unset:
    Type: String
Resources:
  Vpc:
    Type: AWS::EC2::VPC
    Properties:
      CidrBlock: !Ref VpcCidr
"#;

pub const S3_TEMPLATE: &str = r#"
Parameters:
  BucketName:
    Type: String
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: !Sub "${BucketName}-data"
"#;

pub fn test_config() -> DeployConfig {
    let mut config = DeployConfig::new("dev", "demo");
    config.poll = PollPolicy {
        interval: Duration::ZERO,
        max_attempts: 5,
    };
    config
}

pub fn change(action: &str, logical_id: &str, resource_type: &str) -> ResourceChange {
    ResourceChange {
        action: action.to_string(),
        logical_resource_id: logical_id.to_string(),
        physical_resource_id: None,
        resource_type: resource_type.to_string(),
        replacement: None,
        scope: vec![],
    }
}

/// How the fake provider behaves for one stack.
#[derive(Clone)]
pub struct Script {
    pub exists: bool,
    /// Stack creation ends in ROLLBACK_COMPLETE with this reason.
    pub create_fails: Option<String>,
    /// CreateChangeSet call itself is rejected with this message.
    pub change_set_rejected: Option<String>,
    /// Number of `Pending` polls before `change_set_result` is reported.
    pub pending_polls: u32,
    pub change_set_result: ChangeSetStatus,
    pub changes: Vec<ResourceChange>,
    /// Execution ends in UPDATE_ROLLBACK_COMPLETE with this reason.
    pub execute_fails: Option<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            exists: true,
            create_fails: None,
            change_set_rejected: None,
            pending_polls: 0,
            change_set_result: ChangeSetStatus::Ready,
            changes: vec![],
            execute_fails: None,
        }
    }
}

impl Script {
    pub fn no_changes() -> Self {
        Self {
            change_set_result: ChangeSetStatus::Empty,
            ..Self::default()
        }
    }

    pub fn with_changes(changes: Vec<ResourceChange>) -> Self {
        Self {
            changes,
            ..Self::default()
        }
    }
}

/// Call log shared by every fake provider in a test, so ordering across
/// templates can be asserted.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<StackRequest>>>,
    change_set_names: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<StackRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn change_set_names(&self) -> Vec<String> {
        self.change_set_names.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

struct StackState {
    status: Option<StackStatus>,
    change_set_polls: u32,
}

pub struct FakeProvider {
    script: Script,
    recorder: Recorder,
    state: Mutex<StackState>,
}

impl FakeProvider {
    pub fn new(script: Script, recorder: &Recorder) -> Self {
        let status = script
            .exists
            .then(|| StackStatus::from_code("UPDATE_COMPLETE", None));
        Self {
            script,
            recorder: recorder.clone(),
            state: Mutex::new(StackState {
                status,
                change_set_polls: 0,
            }),
        }
    }

    pub fn boxed(script: Script, recorder: &Recorder) -> Box<dyn StackProvider> {
        Box::new(Self::new(script, recorder))
    }
}

impl StackProvider for FakeProvider {
    fn describe_stack<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Option<StackStatus>, ProvisionerError>> {
        Box::pin(async move {
            self.recorder.record(format!("describe_stack {stack_name}"));
            Ok(self.state.lock().unwrap().status.clone())
        })
    }

    fn create_stack<'a>(
        &'a self,
        request: &'a StackRequest,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            self.recorder
                .record(format!("create_stack {}", request.stack_name));
            self.recorder.requests.lock().unwrap().push(request.clone());
            let status = match &self.script.create_fails {
                Some(reason) => StackStatus::from_code("ROLLBACK_COMPLETE", Some(reason.clone())),
                None => StackStatus::from_code("CREATE_COMPLETE", None),
            };
            self.state.lock().unwrap().status = Some(status);
            Ok(())
        })
    }

    fn create_change_set<'a>(
        &'a self,
        request: &'a StackRequest,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            self.recorder
                .record(format!("create_change_set {}", request.stack_name));
            self.recorder.requests.lock().unwrap().push(request.clone());
            self.recorder
                .change_set_names
                .lock()
                .unwrap()
                .push(change_set_name.to_string());
            match &self.script.change_set_rejected {
                Some(msg) => Err(ProvisionerError::ChangeSetFailed(msg.clone())),
                None => {
                    self.state.lock().unwrap().change_set_polls = 0;
                    Ok(())
                }
            }
        })
    }

    fn change_set_status<'a>(
        &'a self,
        stack_name: &'a str,
        _change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<ChangeSetStatus, ProvisionerError>> {
        Box::pin(async move {
            self.recorder
                .record(format!("change_set_status {stack_name}"));
            let mut state = self.state.lock().unwrap();
            if state.change_set_polls < self.script.pending_polls {
                state.change_set_polls += 1;
                return Ok(ChangeSetStatus::Pending);
            }
            Ok(self.script.change_set_result.clone())
        })
    }

    fn describe_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        _change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceChange>, ProvisionerError>> {
        Box::pin(async move {
            self.recorder
                .record(format!("describe_change_set {stack_name}"));
            Ok(self.script.changes.clone())
        })
    }

    fn execute_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        _change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>> {
        Box::pin(async move {
            self.recorder
                .record(format!("execute_change_set {stack_name}"));
            let status = match &self.script.execute_fails {
                Some(reason) => {
                    StackStatus::from_code("UPDATE_ROLLBACK_COMPLETE", Some(reason.clone()))
                }
                None => StackStatus::from_code("UPDATE_COMPLETE", None),
            };
            self.state.lock().unwrap().status = Some(status);
            Ok(())
        })
    }
}

/// Serves template bodies from memory, inline.
pub struct FakeStore {
    templates: HashMap<String, String>,
}

impl FakeStore {
    pub fn new(templates: &[(&str, &str)]) -> Arc<dyn TemplateStore> {
        Arc::new(Self {
            templates: templates
                .iter()
                .map(|(id, body)| (id.to_string(), body.to_string()))
                .collect(),
        })
    }
}

impl TemplateStore for FakeStore {
    fn stage<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<StagedTemplate, ProvisionerError>> {
        Box::pin(async move {
            let body = self
                .templates
                .get(identifier)
                .cloned()
                .ok_or_else(|| ProvisionerError::TemplateNotFound(identifier.to_string()))?;
            Ok(StagedTemplate {
                source: TemplateSource::Body(body.clone()),
                body,
            })
        })
    }
}
