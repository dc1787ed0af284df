use std::path::PathBuf;
use std::time::Duration;

use crate::error::ProvisionerError;
use crate::manifest::{sanitize_name, TemplateSpec};
use crate::poll::PollPolicy;

/// Deploy settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// `ENV`, e.g. "dev" or "prod"
    pub environment: String,
    /// `ProjectName`
    pub project: String,
    /// Directory holding the template files
    pub template_dir: PathBuf,
    /// Directory holding `{env}-parameters.json`
    pub param_dir: PathBuf,
    /// S3 bucket templates are staged to. `None` sends template bodies inline.
    pub template_bucket: Option<String>,
    pub template_prefix: String,
    pub poll: PollPolicy,
}

impl DeployConfig {
    pub fn new(environment: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            project: project.into(),
            template_dir: PathBuf::from("cfn"),
            param_dir: PathBuf::from("param"),
            template_bucket: None,
            template_prefix: "stackrun/templates".to_string(),
            poll: PollPolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self, ProvisionerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProvisionerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| ProvisionerError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(require("ENV")?, require("ProjectName")?);

        if let Some(dir) = get("STACKRUN_TEMPLATE_DIR") {
            config.template_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("STACKRUN_PARAM_DIR") {
            config.param_dir = PathBuf::from(dir);
        }
        config.template_bucket = get("STACKRUN_TEMPLATE_BUCKET");
        if let Some(prefix) = get("STACKRUN_TEMPLATE_PREFIX") {
            config.template_prefix = prefix;
        }
        if let Some(secs) = get("STACKRUN_POLL_INTERVAL_SECS") {
            config.poll.interval = Duration::from_secs(parse_number(
                "STACKRUN_POLL_INTERVAL_SECS",
                &secs,
            )?);
        }
        if let Some(attempts) = get("STACKRUN_POLL_MAX_ATTEMPTS") {
            let attempts = parse_number("STACKRUN_POLL_MAX_ATTEMPTS", &attempts)?;
            config.poll.max_attempts = u32::try_from(attempts)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ProvisionerError::Config(format!(
                        "STACKRUN_POLL_MAX_ATTEMPTS must be between 1 and {}",
                        u32::MAX
                    ))
                })?;
        }

        Ok(config)
    }

    pub fn parameter_file(&self) -> PathBuf {
        self.param_dir
            .join(format!("{}-parameters.json", self.environment))
    }

    /// `{env}-{project}-{suffix}`. Stable across runs so re-deploys hit the
    /// same stack.
    pub fn stack_name(&self, spec: &TemplateSpec) -> String {
        sanitize_name(&format!(
            "{}-{}-{}",
            self.environment,
            self.project,
            spec.stack_suffix()
        ))
    }

    /// S3 prefix for this environment's staged templates.
    pub fn staging_prefix(&self) -> String {
        stackrun_storage::objects::join_key(&[&self.template_prefix, &self.environment])
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ProvisionerError> {
    raw.trim()
        .parse()
        .map_err(|_| ProvisionerError::Config(format!("{key} must be a number, got {raw:?}")))
}
