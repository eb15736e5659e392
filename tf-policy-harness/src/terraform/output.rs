//! Model of `terraform output -json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::{HarnessError, Result};

/// One entry of `terraform output -json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    /// Whether terraform marks the output as sensitive
    #[serde(default)]
    pub sensitive: bool,
    /// Terraform type expression, e.g. `"string"` or `["list", "string"]`
    #[serde(rename = "type", default)]
    pub value_type: JsonValue,
    /// The output value
    pub value: JsonValue,
}

/// Output name to value wrapper, as returned by `terraform output -json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerraformOutputs(pub BTreeMap<String, OutputValue>);

impl TerraformOutputs {
    /// Parses the stdout of `terraform output -json`.
    pub fn parse(raw: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(raw)
            .map_err(|e| HarnessError::json_parsing("terraform output", e))?;

        if !json.is_object() {
            return Err(HarnessError::terraform_output_parse(
                "Terraform output is not a map",
                raw,
            ));
        }

        serde_json::from_value(json).map_err(|e| {
            HarnessError::terraform_output_parse(format!("Unexpected output entry: {e}"), raw)
        })
    }

    /// Looks up an output by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OutputValue> {
        self.0.get(name)
    }

    /// Whether an output with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Output names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Pretty JSON for logs, with sensitive values masked.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        let masked: BTreeMap<&str, JsonValue> = self
            .0
            .iter()
            .map(|(name, output)| {
                let value = if output.sensitive {
                    JsonValue::String("<sensitive>".to_string())
                } else {
                    output.value.clone()
                };
                (
                    name.as_str(),
                    serde_json::json!({
                        "sensitive": output.sensitive,
                        "type": output.value_type,
                        "value": value,
                    }),
                )
            })
            .collect();
        serde_json::to_string_pretty(&masked).unwrap_or_default()
    }
}
