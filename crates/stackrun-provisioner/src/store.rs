use std::path::PathBuf;
use std::time::Duration;

use aws_sdk_s3::Client as S3Client;

use crate::error::ProvisionerError;
use crate::poll::PollPolicy;
use crate::provider::BoxFuture;

/// Where the provider should read the template from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Sent inline with the request.
    Body(String),
    /// Fetched by the provider, e.g. a presigned S3 URL.
    Url(String),
}

/// A template made available to the provider.
#[derive(Debug, Clone)]
pub struct StagedTemplate {
    /// Raw document, used to read the declared parameter names.
    pub body: String,
    pub source: TemplateSource,
}

/// Resolves a template identifier to its document and a location the
/// provider can read it from.
pub trait TemplateStore: Send + Sync {
    fn stage<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<StagedTemplate, ProvisionerError>>;
}

/// Reads templates from a local directory and sends them inline.
pub struct LocalTemplateStore {
    dir: PathBuf,
}

impl LocalTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn read(&self, identifier: &str) -> Result<String, ProvisionerError> {
        let path = self.dir.join(identifier);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                ProvisionerError::TemplateNotFound(path.display().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

impl TemplateStore for LocalTemplateStore {
    fn stage<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<StagedTemplate, ProvisionerError>> {
        Box::pin(async move {
            let body = self.read(identifier).await?;
            Ok(StagedTemplate {
                source: TemplateSource::Body(body.clone()),
                body,
            })
        })
    }
}

/// Reads templates from a local directory, uploads them to S3 and hands the
/// provider a presigned GET URL.
///
/// The URL must outlive the create → change set → execute sequence of one
/// template, so its lifetime is derived from the poll policy driving those
/// waits (see `url_ttl_for`).
pub struct S3TemplateStore {
    local: LocalTemplateStore,
    s3: S3Client,
    bucket: String,
    prefix: String,
    url_ttl: Duration,
}

impl S3TemplateStore {
    pub const MIN_URL_TTL: Duration = Duration::from_secs(300);
    /// SigV4 presigned URLs cannot be valid for longer than seven days.
    pub const MAX_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    const URL_TTL_MARGIN: Duration = Duration::from_secs(60);

    pub fn new(
        dir: impl Into<PathBuf>,
        s3: S3Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        poll: &PollPolicy,
    ) -> Self {
        Self {
            local: LocalTemplateStore::new(dir),
            s3,
            bucket: bucket.into(),
            prefix: prefix.into(),
            url_ttl: Self::url_ttl_for(poll),
        }
    }

    /// Presigned URL lifetime for one template run under `poll`: the create,
    /// change set and execute waits back to back, plus a margin for the API
    /// calls between them. Never below `MIN_URL_TTL` or above `MAX_URL_TTL`.
    pub fn url_ttl_for(poll: &PollPolicy) -> Duration {
        poll.max_wait()
            .saturating_mul(3)
            .saturating_add(Self::URL_TTL_MARGIN)
            .clamp(Self::MIN_URL_TTL, Self::MAX_URL_TTL)
    }

    pub fn key_for(&self, identifier: &str) -> String {
        stackrun_storage::objects::join_key(&[&self.prefix, identifier])
    }
}

impl TemplateStore for S3TemplateStore {
    fn stage<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<StagedTemplate, ProvisionerError>> {
        Box::pin(async move {
            let body = self.local.read(identifier).await?;
            let key = self.key_for(identifier);

            let etag = stackrun_storage::objects::put_object(
                &self.s3,
                &self.bucket,
                &key,
                body.clone().into_bytes(),
                Some("application/x-yaml"),
            )
            .await?;

            let url = stackrun_storage::objects::presign_get(
                &self.s3,
                &self.bucket,
                &key,
                self.url_ttl,
            )
            .await?;

            tracing::info!(
                bucket = %self.bucket,
                key = %key,
                etag = %etag,
                url_ttl_secs = self.url_ttl.as_secs(),
                "template staged"
            );

            Ok(StagedTemplate {
                body,
                source: TemplateSource::Url(url),
            })
        })
    }
}
