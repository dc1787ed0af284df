use url::Url;

use crate::error::NotifyError;

/// Login the CI token comments as on GitHub Actions.
pub const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";

/// Where and as whom reports are posted.
#[derive(Clone)]
pub struct NotifyConfig {
    /// `URL`: the pull request's comments endpoint. `None` disables reporting.
    pub comments_url: Option<Url>,
    /// `GITHUB_TOKEN`
    pub token: String,
    /// Author whose old reports may be deleted.
    pub bot_login: String,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("comments_url", &self.comments_url)
            .field("token", &"[REDACTED]")
            .field("bot_login", &self.bot_login)
            .finish()
    }
}

impl NotifyConfig {
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. An empty `URL` counts as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NotifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let comments_url = match lookup("URL").filter(|u| !u.trim().is_empty()) {
            Some(raw) => Some(Url::parse(raw.trim()).map_err(|e| NotifyError::InvalidUrl {
                url: raw.clone(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            comments_url,
            token: lookup("GITHUB_TOKEN").unwrap_or_default(),
            bot_login: lookup("STACKRUN_BOT_LOGIN")
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BOT_LOGIN.to_string()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.comments_url.is_some()
    }
}
