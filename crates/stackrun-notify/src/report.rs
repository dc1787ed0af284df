use serde::Serialize;

use crate::error::NotifyError;

/// A rendered run report. Comments starting with `banner` belong to the same
/// environment and mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub banner: String,
    pub body: String,
}

impl Report {
    pub fn banner(environment: &str, mode: &str) -> String {
        format!("***** {environment} {mode} result *****")
    }

    /// Banner, blank line, then the result as a fenced JSON block.
    pub fn render<T: Serialize>(
        environment: &str,
        mode: &str,
        result: &T,
    ) -> Result<Self, NotifyError> {
        let banner = Self::banner(environment, mode);
        let json = serde_json::to_string_pretty(result)?;
        let body = format!("{banner}\n\n```json\n{json}\n```\n");
        Ok(Self { banner, body })
    }
}
