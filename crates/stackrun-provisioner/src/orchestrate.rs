use std::fmt;

use crate::driver::StackDriver;
use crate::outcome::DeploymentResult;
use crate::params::ParameterSet;

/// Preview only, or preview and apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DryRun,
    Deploy,
}

impl Mode {
    pub fn from_dryrun_flag(dryrun: bool) -> Self {
        if dryrun { Mode::DryRun } else { Mode::Deploy }
    }

    pub fn deploys(self) -> bool {
        self == Mode::Deploy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::DryRun => "dryrun",
            Mode::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every driver in manifest order and collect the outcomes.
///
/// Strictly sequential: a template is finished, including all waits, before
/// the next one starts. Failed outcomes are recorded and the loop moves on.
pub async fn run_all(
    drivers: &[StackDriver],
    params: &ParameterSet,
    mode: Mode,
) -> DeploymentResult {
    let mut result = DeploymentResult::new();

    for driver in drivers {
        let target = driver.spec().to_string();
        tracing::info!(template = %target, mode = %mode, "***** template start *****");

        let outcome = driver.run(params, mode).await;

        if outcome.is_failed() {
            tracing::warn!(template = %target, outcome = %outcome.summary(), "***** template finished *****");
        } else {
            tracing::info!(template = %target, outcome = %outcome.summary(), "***** template finished *****");
        }
        result.insert(target, outcome);
    }

    result
}
