//! stackrun-provisioner
//!
//! Deployment engine for an ordered list of CloudFormation templates.
//!
//! Public API:
//! - `Manifest::default_templates()` — the fixed, ordered template list
//! - `params::resolve()` — pick the parameters a template declares
//! - `StackDriver::run()` — drive one template to an `Outcome`
//! - `run_all()` — drive every template in order into a `DeploymentResult`

pub mod cloudformation;
pub mod config;
pub mod driver;
pub mod error;
pub mod manifest;
pub mod orchestrate;
pub mod outcome;
pub mod params;
pub mod poll;
pub mod provider;
pub mod store;
pub mod template;

pub use crate::cloudformation::CloudFormationProvider;
pub use crate::config::DeployConfig;
pub use crate::driver::StackDriver;
pub use crate::error::ProvisionerError;
pub use crate::manifest::{Manifest, TemplateSpec};
pub use crate::orchestrate::{run_all, Mode};
pub use crate::outcome::{DeploymentResult, Outcome, ResourceChange};
pub use crate::params::{Parameter, ParameterSet};
pub use crate::poll::{poll_until, PollPolicy, Probe};
pub use crate::provider::StackProvider;
pub use crate::store::{LocalTemplateStore, S3TemplateStore, TemplateStore};
