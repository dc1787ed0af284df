use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One resource the change set would add, modify or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChange {
    /// "Add", "Modify", "Remove", ...
    pub action: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// e.g. "AWS::EC2::VPC"
    pub resource_type: String,
    /// "True", "False" or "Conditional" for modifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
}

/// What happened to one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Dry-run against a stack that has never been deployed.
    NotFound { stack_name: String },
    /// The change set was empty.
    NoChange,
    /// The planned changes (applied, in deploy mode).
    Changes { changes: Vec<ResourceChange> },
    Failed { error: String },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    /// Short label for log lines.
    pub fn summary(&self) -> String {
        match self {
            Outcome::NotFound { stack_name } => format!("{stack_name} stack does not exist"),
            Outcome::NoChange => "no changes".to_string(),
            Outcome::Changes { changes } => format!("{} resource change(s)", changes.len()),
            Outcome::Failed { error } => format!("failed: {error}"),
        }
    }
}

/// Outcomes keyed by `"{identifier} @ {region}"`, in deployment order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentResult {
    entries: Vec<(String, Outcome)>,
}

impl DeploymentResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. A repeated key replaces the earlier outcome in place.
    pub fn insert(&mut self, target: impl Into<String>, outcome: Outcome) {
        let target = target.into();
        match self.entries.iter_mut().find(|(t, _)| *t == target) {
            Some((_, existing)) => *existing = outcome,
            None => self.entries.push((target, outcome)),
        }
    }

    pub fn get(&self, target: &str) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, o)| o)
    }

    pub fn targets(&self) -> Vec<&str> {
        self.entries.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Targets whose outcome is `Failed`.
    pub fn failures(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(t, _)| t.as_str())
            .collect()
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for DeploymentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (target, outcome) in &self.entries {
            map.serialize_entry(target, outcome)?;
        }
        map.end()
    }
}
