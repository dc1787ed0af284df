use serde_yaml::Value;

use crate::error::ProvisionerError;

/// Names under the template's top-level `Parameters` section, in document order.
///
/// Accepts YAML and JSON templates, including CloudFormation short-form tags
/// (`!Ref`, `!Sub`, ...). A template without `Parameters` declares nothing.
pub fn declared_parameters(body: &str) -> Result<Vec<String>, ProvisionerError> {
    let doc: Value =
        serde_yaml::from_str(body).map_err(|e| ProvisionerError::TemplateParse(e.to_string()))?;

    let Some(section) = doc.get("Parameters") else {
        return Ok(vec![]);
    };

    match section {
        Value::Mapping(map) => Ok(map
            .iter()
            .filter_map(|(k, _)| k.as_str().map(String::from))
            .collect()),
        Value::Null => Ok(vec![]),
        other => Err(ProvisionerError::TemplateParse(format!(
            "`Parameters` must be a mapping, found {}",
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
