//! Error handling module

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for operations that can fail with `HarnessError`
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Error type for the module harness.
///
/// This enum covers the failures that can occur while preparing fixtures,
/// driving the terraform binary and checking the resulting policy document.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// File system operation errors with detailed context
    #[error("File system error during {operation} on path '{path}': {source}")]
    FileSystem {
        /// The operation that failed (e.g., "write", "remove directory")
        operation: String,
        /// The file path involved in the operation
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing and serialization errors with context
    #[error("JSON parsing error in {context}: {source}")]
    JsonParsing {
        /// Context where the JSON error occurred (e.g., "terraform output", "policy_json")
        context: String,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors for environment or flag values
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message about the configuration issue
        message: String,
    },

    /// Input validation errors for user-provided data
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed validation error message
        message: String,
        /// Optional field name that failed validation
        field: Option<String>,
    },

    /// The terraform binary could not be started
    #[error("Failed to launch `{command}`: {source}")]
    TerraformLaunch {
        /// Rendered command line
        command: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A terraform command ran and exited unsuccessfully
    #[error("Error performing terraform command `{command}` (exit status {status:?}): {message}")]
    TerraformCommand {
        /// Rendered command line
        command: String,
        /// Exit code, absent when the process was killed by a signal
        status: Option<i32>,
        /// Captured stderr
        message: String,
    },

    /// `terraform output -json` returned something other than an output map
    #[error("Failed to parse terraform output: {message}. Terraform output: {terraform_output}")]
    TerraformOutputParse {
        /// Detailed error message
        message: String,
        /// Raw output as returned by terraform
        terraform_output: String,
    },

    /// A structural check on the policy document failed
    #[error("Policy assertion failed: {message}")]
    PolicyAssertion {
        /// What was expected and what was found
        message: String,
    },
}

impl HarnessError {
    /// Create a file system error with operation context
    pub(crate) fn file_system(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parsing error with context
    pub(crate) fn json_parsing(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParsing {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error for a named field
    pub(crate) fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub(crate) fn terraform_launch(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::TerraformLaunch {
            command: command.into(),
            source,
        }
    }

    pub(crate) fn terraform_command(
        command: impl Into<String>,
        status: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self::TerraformCommand {
            command: command.into(),
            status,
            message: message.into(),
        }
    }

    pub(crate) fn terraform_output_parse(
        message: impl Into<String>,
        terraform_output: impl Into<String>,
    ) -> Self {
        Self::TerraformOutputParse {
            message: message.into(),
            terraform_output: terraform_output.into(),
        }
    }

    /// Create a policy assertion error
    pub(crate) fn policy_assertion(message: impl Into<String>) -> Self {
        Self::PolicyAssertion {
            message: message.into(),
        }
    }

    /// True for failures of the structural policy checks.
    #[must_use]
    pub const fn is_policy_assertion(&self) -> bool {
        matches!(self, Self::PolicyAssertion { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_system_error_creation() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = HarnessError::file_system("remove file", "/path/to/.terraform.lock.hcl", io_error);

        assert!(matches!(error, HarnessError::FileSystem { .. }));
        assert!(error.to_string().contains("remove file"));
        assert!(error.to_string().contains("/path/to/.terraform.lock.hcl"));
    }

    #[test]
    fn test_terraform_command_error_message() {
        let error = HarnessError::terraform_command("terraform apply", Some(1), "no credentials");

        let message = error.to_string();
        assert!(message.contains("terraform apply"));
        assert!(message.contains("Some(1)"));
        assert!(message.contains("no credentials"));
    }

    #[test]
    fn test_policy_assertion_is_distinguishable() {
        assert!(HarnessError::policy_assertion("Statement is empty").is_policy_assertion());
        assert!(!HarnessError::configuration("bad").is_policy_assertion());
    }

    #[test]
    fn test_configuration_error_carries_only_its_message() {
        let error = HarnessError::configuration("KEEP_AFTER must be a boolean");

        assert_eq!(
            error.to_string(),
            "Configuration error: KEEP_AFTER must be a boolean"
        );
        assert!(std::error::Error::source(&error).is_none());
    }
}
