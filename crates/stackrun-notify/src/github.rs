//! Pull request comment client using reqwest.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::report::Report;

const PAGE_SIZE: usize = 100;
const USER_AGENT_VALUE: &str = concat!("stackrun/", env!("CARGO_PKG_VERSION"));

/// A pull request comment as returned by the comments API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub id: u64,
    /// API URL of this comment; the target for deletion.
    pub url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: Option<CommentAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
}

impl Comment {
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.login.as_str())
    }

    /// An earlier report from this automation for the same banner.
    pub fn is_stale_report(&self, bot_login: &str, banner: &str) -> bool {
        self.author() == Some(bot_login) && self.body.starts_with(banner)
    }
}

#[derive(Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

/// What `publish` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    pub deleted: usize,
    pub posted: Comment,
}

/// Client for one pull request's comment thread.
pub struct GithubNotifier {
    client: Client,
    comments_url: Url,
    token: String,
    bot_login: String,
}

impl std::fmt::Debug for GithubNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubNotifier")
            .field("comments_url", &self.comments_url)
            .field("token", &"[REDACTED]")
            .field("bot_login", &self.bot_login)
            .finish()
    }
}

impl GithubNotifier {
    pub fn new(
        comments_url: Url,
        token: impl Into<String>,
        bot_login: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            comments_url,
            token: token.into(),
            bot_login: bot_login.into(),
        })
    }

    /// `None` when no comments URL is configured.
    pub fn from_config(config: &NotifyConfig) -> Result<Option<Self>, NotifyError> {
        match &config.comments_url {
            Some(url) => Ok(Some(Self::new(
                url.clone(),
                config.token.clone(),
                config.bot_login.clone(),
            )?)),
            None => Ok(None),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, USER_AGENT_VALUE)
    }

    /// Every comment on the thread, following pages until a short one.
    pub async fn list_comments(&self) -> Result<Vec<Comment>, NotifyError> {
        let mut comments = Vec::new();
        let per_page = PAGE_SIZE.to_string();

        for page in 1.. {
            let page_str = page.to_string();
            let resp = self
                .authorized(self.client.get(self.comments_url.clone()))
                .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())])
                .send()
                .await?;

            let batch: Vec<Comment> = check_status(resp).await?.json().await?;
            let done = batch.len() < PAGE_SIZE;
            comments.extend(batch);
            if done {
                break;
            }
        }

        tracing::debug!(count = comments.len(), "comments listed");
        Ok(comments)
    }

    pub async fn post_comment(&self, body: &str) -> Result<Comment, NotifyError> {
        let resp = self
            .authorized(self.client.post(self.comments_url.clone()))
            .json(&NewComment { body })
            .send()
            .await?;

        let comment: Comment = check_status(resp).await?.json().await?;
        tracing::info!(comment_id = comment.id, "report comment posted");
        Ok(comment)
    }

    pub async fn delete_comment(&self, comment: &Comment) -> Result<(), NotifyError> {
        let url = Url::parse(&comment.url).map_err(|e| NotifyError::InvalidUrl {
            url: comment.url.clone(),
            message: e.to_string(),
        })?;

        let resp = self
            .authorized(self.client.delete(url))
            .send()
            .await?;
        check_status(resp).await?;

        tracing::info!(comment_id = comment.id, "stale report comment deleted");
        Ok(())
    }

    /// Post `report`, then delete this automation's earlier reports with the
    /// same banner. A failed post leaves the previous report in place.
    pub async fn publish(&self, report: &Report) -> Result<PublishSummary, NotifyError> {
        let posted = self.post_comment(&report.body).await?;

        let stale: Vec<Comment> = self
            .list_comments()
            .await?
            .into_iter()
            .filter(|c| c.id != posted.id && c.is_stale_report(&self.bot_login, &report.banner))
            .collect();

        for comment in &stale {
            self.delete_comment(comment).await?;
        }

        Ok(PublishSummary {
            deleted: stale.len(),
            posted,
        })
    }
}

async fn check_status(resp: Response) -> Result<Response, NotifyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body.clone()
        }
    });

    Err(NotifyError::Api {
        status: status.as_u16(),
        message,
    })
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok()?;
    parsed
        .get("message")
        .and_then(|m| m.as_str())
        .map(ToOwned::to_owned)
}
