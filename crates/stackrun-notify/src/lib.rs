//! stackrun-notify
//!
//! Publishes run reports as pull request comments and removes the previous
//! report for the same environment and mode.

pub mod config;
pub mod error;
pub mod github;
pub mod report;

pub use crate::config::NotifyConfig;
pub use crate::error::NotifyError;
pub use crate::github::{Comment, GithubNotifier};
pub use crate::report::Report;
