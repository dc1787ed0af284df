use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One deployable template and the region its stack lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// File name under the template directory, e.g. "vpc.yml"
    pub identifier: String,
    /// e.g. "ap-northeast-1"
    pub region: String,
}

impl TemplateSpec {
    pub fn new(identifier: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            region: region.into(),
        }
    }

    /// The identifier without its extension: "vpc.yml" → "vpc".
    ///
    /// Used as the last segment of the stack name and as the change set prefix.
    pub fn stack_suffix(&self) -> &str {
        Path::new(&self.identifier)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.identifier)
    }
}

impl fmt::Display for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} @ {}", self.identifier, self.region)
    }
}

/// The ordered template list. Position is deployment order: later templates
/// may reference resources created by earlier ones.
pub struct Manifest {
    pub templates: Vec<TemplateSpec>,
}

impl Manifest {
    pub const DEFAULT_REGION: &'static str = "ap-northeast-1";

    /// Network layer first, then storage.
    pub fn default_templates() -> Self {
        Manifest {
            templates: vec![
                TemplateSpec::new("vpc.yml", Self::DEFAULT_REGION),
                TemplateSpec::new("s3.yml", Self::DEFAULT_REGION),
            ],
        }
    }

    /// Distinct regions in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = Vec::new();
        for spec in &self.templates {
            if !regions.contains(&spec.region.as_str()) {
                regions.push(&spec.region);
            }
        }
        regions
    }
}

/// Replace every character CloudFormation rejects in stack and change set
/// names with `-`. Names must also start with a letter.
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();

    if cleaned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        cleaned
    } else {
        format!("s-{cleaned}")
    }
}
