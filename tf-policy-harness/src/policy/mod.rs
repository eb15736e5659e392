//! Structural checks on the policy document rendered by the module.

use serde_json::Value as JsonValue;

use crate::errors::{HarnessError, Result};
use crate::terraform::output::TerraformOutputs;

/// Name of the module output carrying the JSON-encoded policy
pub const POLICY_OUTPUT: &str = "policy_json";

/// A parsed IAM policy document
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    document: JsonValue,
}

impl PolicyDocument {
    /// Parses a JSON-encoded policy without checking its shape.
    pub fn parse(raw: &str) -> Result<Self> {
        let document =
            serde_json::from_str(raw).map_err(|e| HarnessError::json_parsing(POLICY_OUTPUT, e))?;
        Ok(Self { document })
    }

    /// The `Version` field, if present.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.document.get("Version").and_then(JsonValue::as_str)
    }

    /// The `Statement` entries; empty when missing or not a list.
    #[must_use]
    pub fn statements(&self) -> &[JsonValue] {
        self.document
            .get("Statement")
            .and_then(JsonValue::as_array)
            .map_or(&[] as &[JsonValue], Vec::as_slice)
    }

    /// The raw JSON value.
    #[must_use]
    pub const fn as_json(&self) -> &JsonValue {
        &self.document
    }
}

/// Extracts and parses the `policy_json` output.
pub fn policy_document(outputs: &TerraformOutputs) -> Result<PolicyDocument> {
    let output = outputs.get(POLICY_OUTPUT).ok_or_else(|| {
        let present = outputs.names().collect::<Vec<_>>().join(", ");
        HarnessError::policy_assertion(format!(
            "output '{POLICY_OUTPUT}' is missing (outputs: [{present}])"
        ))
    })?;

    let raw = output.value.as_str().ok_or_else(|| {
        HarnessError::policy_assertion(format!(
            "output '{POLICY_OUTPUT}' must be a JSON-encoded string, got {}",
            output.value
        ))
    })?;

    PolicyDocument::parse(raw)
}

/// Requires a `Statement` key holding a non-empty list.
pub fn check_policy_document(policy: &PolicyDocument) -> Result<()> {
    let statement = policy
        .as_json()
        .get("Statement")
        .ok_or_else(|| HarnessError::policy_assertion("policy has no 'Statement' key"))?;

    let statements = statement.as_array().ok_or_else(|| {
        HarnessError::policy_assertion(format!("'Statement' must be a list, got {statement}"))
    })?;

    if statements.is_empty() {
        return Err(HarnessError::policy_assertion("'Statement' is empty"));
    }
    Ok(())
}

/// Extracts, parses and checks `policy_json` in one step.
pub fn assert_policy_output(outputs: &TerraformOutputs) -> Result<PolicyDocument> {
    let policy = policy_document(outputs)?;
    check_policy_document(&policy)?;
    Ok(policy)
}
