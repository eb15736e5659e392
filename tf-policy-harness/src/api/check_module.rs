use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::config::{ProviderVersion, TestParameters};
use crate::errors::Result;
use crate::fixtures::write_fixtures;
use crate::policy::assert_policy_output;
use crate::terraform::apply::{with_terraform_apply, ApplyOptions};
use crate::terraform::TerraformRunner;

/// Outcome of one successful module check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleCheckReport {
    /// Provider version the module was applied with
    pub provider_version: ProviderVersion,
    /// The constraint written into `terraform.tf`
    pub provider_constraint: String,
    /// Directory the module was applied in
    pub module_dir: PathBuf,
    /// Number of entries in the policy's `Statement`
    pub statement_count: usize,
    /// Whether resources were left in place
    pub kept: bool,
}

/// Writes fixtures, applies the module and checks its `policy_json` output.
///
/// Resources are destroyed afterwards unless `keep_after` is set, including
/// when the policy check fails. Terraform failures are returned unchanged.
pub fn check_module<R: TerraformRunner + ?Sized>(
    runner: &R,
    module_dir: &Path,
    params: &TestParameters,
    keep_after: bool,
) -> Result<ModuleCheckReport> {
    write_fixtures(module_dir, params)?;

    let options = ApplyOptions {
        destroy_after: !keep_after,
        json_output: true,
    };

    let statement_count = with_terraform_apply(runner, module_dir, options, |outputs| {
        info!("{}", outputs.to_pretty_json());
        let policy = assert_policy_output(outputs)?;
        Ok(policy.statements().len())
    })?;

    info!(
        "Module check passed with provider {} ({} statements)",
        params.provider_version.constraint(),
        statement_count
    );

    Ok(ModuleCheckReport {
        provider_version: params.provider_version,
        provider_constraint: params.provider_version.constraint().to_string(),
        module_dir: module_dir.to_path_buf(),
        statement_count,
        kept: keep_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HarnessError;
    use crate::fixtures::{STATE_DIR, TFVARS_FILE, VERSIONS_FILE};
    use crate::terraform::testing::ScriptedRunner;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn output_for(policy: &serde_json::Value) -> String {
        json!({
            "policy_json": {
                "sensitive": false,
                "type": "string",
                "value": policy.to_string()
            }
        })
        .to_string()
    }

    fn params() -> TestParameters {
        TestParameters::new("us-east-1".to_string(), None, ProviderVersion::Aws6)
    }

    #[test_log::test]
    fn test_check_module_passes_and_destroys() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();
        let runner = ScriptedRunner::new().respond(
            "output",
            0,
            &output_for(&json!({
                "Version": "2012-10-17",
                "Statement": [{"Effect": "Allow", "Action": "sts:GetCallerIdentity", "Resource": "*"}]
            })),
            "",
        );

        let report = check_module(&runner, dir.path(), &params(), false).unwrap();

        assert_eq!(report.statement_count, 1);
        assert_eq!(report.provider_constraint, "~> 6.0");
        assert!(!report.kept);
        assert_eq!(runner.subcommands(), vec!["init", "apply", "output", "destroy"]);

        assert!(!dir.path().join(STATE_DIR).exists());
        let tf = fs::read_to_string(dir.path().join(VERSIONS_FILE)).unwrap();
        assert!(tf.contains("version = \"~> 6.0\""));
        let tfvars = fs::read_to_string(dir.path().join(TFVARS_FILE)).unwrap();
        assert!(tfvars.contains("region = \"us-east-1\""));
    }

    #[test_log::test]
    fn test_check_module_assertion_failure_still_destroys() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().respond(
            "output",
            0,
            &output_for(&json!({"Version": "2012-10-17", "Statement": []})),
            "",
        );

        let err = check_module(&runner, dir.path(), &params(), false).unwrap_err();

        assert!(err.is_policy_assertion());
        assert_eq!(runner.subcommands(), vec!["init", "apply", "output", "destroy"]);
    }

    #[test_log::test]
    fn test_check_module_keep_after() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().respond(
            "output",
            0,
            &output_for(&json!({"Statement": [{"Effect": "Deny", "Action": "*", "Resource": "*"}]})),
            "",
        );

        let report = check_module(&runner, dir.path(), &params(), true).unwrap();

        assert!(report.kept);
        assert_eq!(runner.subcommands(), vec!["init", "apply", "output"]);
    }

    #[test_log::test]
    fn test_check_module_propagates_terraform_failure() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().respond("apply", 1, "", "Error: InvalidClientTokenId");

        let err = check_module(&runner, dir.path(), &params(), false).unwrap_err();

        assert!(matches!(err, HarnessError::TerraformCommand { ref message, .. } if message.contains("InvalidClientTokenId")));
        assert_eq!(runner.subcommands(), vec!["init", "apply", "destroy"]);
    }

    #[test]
    fn test_report_serializes_pascal_case() {
        let report = ModuleCheckReport {
            provider_version: ProviderVersion::Aws5,
            provider_constraint: "~> 5.62".to_string(),
            module_dir: PathBuf::from("test_data/test_module"),
            statement_count: 2,
            kept: false,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ProviderVersion"], "aws-5");
        assert_eq!(json["StatementCount"], 2);
    }
}
