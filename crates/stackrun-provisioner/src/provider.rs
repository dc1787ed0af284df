use std::future::Future;
use std::pin::Pin;

use crate::error::ProvisionerError;
use crate::outcome::ResourceChange;
use crate::params::Parameter;
use crate::store::TemplateSource;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capability acknowledged on every create and change set call.
pub const CAPABILITY_NAMED_IAM: &str = "CAPABILITY_NAMED_IAM";

/// Everything needed to create a stack or compute a change set against it.
#[derive(Debug, Clone)]
pub struct StackRequest {
    pub stack_name: String,
    pub template: TemplateSource,
    pub parameters: Vec<Parameter>,
    pub capabilities: Vec<String>,
}

/// Coarse grouping of the provider's stack status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    /// Any `*_IN_PROGRESS` status.
    InProgress,
    /// `CREATE_COMPLETE`, `UPDATE_COMPLETE`, `IMPORT_COMPLETE`.
    Stable,
    /// Failed or rolled back.
    Failed,
}

/// Status of a live stack as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackStatus {
    /// Raw status code, e.g. "UPDATE_ROLLBACK_COMPLETE"
    pub status: String,
    pub reason: Option<String>,
    pub phase: StackPhase,
}

impl StackStatus {
    pub fn from_code(status: &str, reason: Option<String>) -> Self {
        Self {
            status: status.to_string(),
            reason,
            phase: classify_stack_status(status),
        }
    }

    /// "STATUS: reason", or just the status when the provider gave no reason.
    pub fn describe(&self) -> String {
        match &self.reason {
            Some(reason) => format!("{}: {reason}", self.status),
            None => self.status.clone(),
        }
    }
}

pub fn classify_stack_status(status: &str) -> StackPhase {
    match status {
        "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "IMPORT_COMPLETE" => StackPhase::Stable,
        s if s.ends_with("_IN_PROGRESS") => StackPhase::InProgress,
        _ => StackPhase::Failed,
    }
}

/// Status of a change set while it is being computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetStatus {
    Pending,
    Ready,
    /// The provider refused to create the change set because nothing differs.
    Empty,
    Failed(String),
}

/// Terminal result of waiting on a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    Ready,
    Empty,
    Failed(String),
}

/// The provider's change-management API, one region per instance.
///
/// Methods return boxed futures for dyn compatibility.
pub trait StackProvider: Send + Sync {
    /// Current status of the stack. `None` = doesn't exist.
    fn describe_stack<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Option<StackStatus>, ProvisionerError>>;

    /// Start creating the stack. Does not wait.
    fn create_stack<'a>(
        &'a self,
        request: &'a StackRequest,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>>;

    /// Start computing an UPDATE change set. Does not wait.
    fn create_change_set<'a>(
        &'a self,
        request: &'a StackRequest,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>>;

    fn change_set_status<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<ChangeSetStatus, ProvisionerError>>;

    /// Every resource change in a computed change set.
    fn describe_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ResourceChange>, ProvisionerError>>;

    /// Start applying a computed change set. Does not wait.
    fn execute_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_name: &'a str,
    ) -> BoxFuture<'a, Result<(), ProvisionerError>>;
}
