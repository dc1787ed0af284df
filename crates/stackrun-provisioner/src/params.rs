use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionerError;

/// All parameter values for one environment, loaded from
/// `{env}-parameters.json`. Covers the union of every template's needs.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    values: HashMap<String, String>,
}

#[derive(Deserialize)]
struct ParameterFile {
    #[serde(rename = "Parameters")]
    parameters: HashMap<String, String>,
}

/// A single resolved stack parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

impl ParameterSet {
    /// Parse a parameter file body: `{"Parameters": {"Name": "value", ...}}`.
    pub fn from_json(json: &str) -> Result<Self, ProvisionerError> {
        let file: ParameterFile = serde_json::from_str(json)
            .map_err(|e| ProvisionerError::Parameters(e.to_string()))?;
        Ok(Self {
            values: file.parameters,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, ProvisionerError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            ProvisionerError::Parameters(format!("{}: {e}", path.display()))
        })?;
        let set = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), count = set.len(), "parameter file loaded");
        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Keep the declared names that have a value, in declared order.
///
/// Declared-but-missing names are dropped without error; CloudFormation's own
/// validation reports them when the change set is computed.
pub fn resolve<S: AsRef<str>>(params: &ParameterSet, declared: &[S]) -> Vec<Parameter> {
    declared
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            params.get(name).map(|value| Parameter {
                key: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}
