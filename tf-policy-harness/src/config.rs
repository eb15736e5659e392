//! Test parameters and their environment-backed defaults.

use std::fmt;
use std::str::FromStr;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, Result};

/// Environment variable carrying the optional role ARN passed to the provider
pub const TEST_ROLE_ARN_ENV: &str = "TEST_ROLE_ARN";
/// Environment variable that keeps resources after the check when truthy
pub const KEEP_AFTER_ENV: &str = "KEEP_AFTER";
/// Environment variable selecting the AWS region
pub const AWS_REGION_ENV: &str = "AWS_REGION";
/// Environment variable overriding the terraform executable
pub const TERRAFORM_BINARY_ENV: &str = "TERRAFORM_BINARY";

/// Region used when `AWS_REGION` is not set
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
/// Directory holding the terraform test modules, relative to the repository root
pub const TERRAFORM_ROOT_DIR: &str = "test_data";
/// Name of the test module directory under [`TERRAFORM_ROOT_DIR`]
pub const TEST_MODULE_NAME: &str = "test_module";

/// AWS provider version constraints the module is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderVersion {
    /// `~> 5.62`
    #[serde(rename = "aws-5")]
    Aws5,
    /// `~> 6.0`
    #[serde(rename = "aws-6")]
    Aws6,
}

impl ProviderVersion {
    /// Every supported constraint, in test order.
    pub const ALL: [Self; 2] = [Self::Aws5, Self::Aws6];

    /// Version constraint written into `required_providers`.
    #[must_use]
    pub const fn constraint(self) -> &'static str {
        match self {
            Self::Aws5 => "~> 5.62",
            Self::Aws6 => "~> 6.0",
        }
    }

    /// Short identifier used in test names and CLI flags.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Aws5 => "aws-5",
            Self::Aws6 => "aws-6",
        }
    }
}

impl fmt::Display for ProviderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderVersion {
    type Err = HarnessError;

    /// Accepts either the identifier (`aws-6`) or the constraint (`~> 6.0`).
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.id() == wanted || v.constraint() == wanted)
            .ok_or_else(|| {
                let supported = Self::ALL
                    .iter()
                    .map(|v| format!("{} ({})", v.id(), v.constraint()))
                    .collect::<Vec<_>>()
                    .join(", ");
                HarnessError::validation_field(
                    format!("unsupported provider version '{wanted}', expected one of: {supported}"),
                    "provider_version",
                )
            })
    }
}

/// Parameters that drive one fixture write and apply.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TestParameters {
    /// AWS region for the provider
    pub region: String,
    /// Role the provider assumes, if any
    pub role_arn: Option<String>,
    /// AWS provider version constraint
    pub provider_version: ProviderVersion,
}

/// Harness settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// `TEST_ROLE_ARN`, absent when unset or empty
    pub test_role_arn: Option<String>,
    /// `KEEP_AFTER`, false when unset
    pub keep_after: bool,
    /// `AWS_REGION`, [`DEFAULT_AWS_REGION`] when unset
    pub aws_region: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_role_arn: None,
            keep_after: false,
            aws_region: DEFAULT_AWS_REGION.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Loads the settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `KEEP_AFTER` is not a recognised boolean.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `KEEP_AFTER` is not a recognised boolean.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let keep_after = match read(KEEP_AFTER_ENV) {
            Some(raw) => parse_bool(KEEP_AFTER_ENV, &raw)?,
            None => false,
        };

        Ok(Self {
            test_role_arn: read(TEST_ROLE_ARN_ENV),
            keep_after,
            aws_region: read(AWS_REGION_ENV).unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
        })
    }

    /// Test parameters for one provider version.
    #[must_use]
    pub fn parameters(&self, provider_version: ProviderVersion) -> TestParameters {
        TestParameters::new(
            self.aws_region.clone(),
            self.test_role_arn.clone(),
            provider_version,
        )
    }
}

/// Parses `1/0/true/false/yes/no`, case-insensitively.
///
/// # Errors
///
/// Returns a configuration error naming `name` for any other value.
pub fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(HarnessError::configuration(format!(
            "{name} must be a boolean (1/0/true/false/yes/no), got '{other}'"
        ))),
    }
}
