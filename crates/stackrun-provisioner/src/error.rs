use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template parse error: {0}")]
    TemplateParse(String),

    #[error("parameter file error: {0}")]
    Parameters(String),

    #[error("stack creation failed: {0}")]
    CreateFailed(String),

    #[error("change set failed: {0}")]
    ChangeSetFailed(String),

    #[error("change set execution failed: {0}")]
    ExecuteFailed(String),

    #[error("timed out waiting for {what} after {attempts} attempts")]
    TimedOut { what: String, attempts: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("AWS error: {0}")]
    Aws(String),

    #[error("storage error: {0}")]
    Storage(#[from] stackrun_storage::error::StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvisionerError {
    /// Prepend the stack name to the error message.
    pub fn with_stack(self, stack_name: &str) -> Self {
        match self {
            Self::CreateFailed(msg) => Self::CreateFailed(format!("{stack_name}: {msg}")),
            Self::ChangeSetFailed(msg) => Self::ChangeSetFailed(format!("{stack_name}: {msg}")),
            Self::ExecuteFailed(msg) => Self::ExecuteFailed(format!("{stack_name}: {msg}")),
            Self::Aws(msg) => Self::Aws(format!("{stack_name}: {msg}")),
            other => other,
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// AWS SDK errors often have terse `Display` impls (e.g. "service error")
/// but useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
