//! Integration-test harness for the IAM policy Terraform module.
//!
//! - writes `terraform.tfvars` and `terraform.tf` for a region, optional role
//!   and AWS provider version, after clearing stale `terraform init` state
//! - applies the module with a guaranteed `terraform destroy`
//! - checks that the `policy_json` output holds a non-empty `Statement` list
//!

pub mod api;
pub mod config;
pub mod errors;
pub mod fixtures;
pub mod policy;
pub mod terraform;

// Re-exports for a small, focused public API
pub use api::{check_module, default_module_dir, prepare_module, ModuleCheckReport};
pub use config::{HarnessConfig, ProviderVersion, TestParameters};
pub use errors::{HarnessError, Result};
pub use policy::{assert_policy_output, PolicyDocument};
pub use terraform::apply::{with_terraform_apply, ApplyOptions, TerraformApply};
pub use terraform::output::{OutputValue, TerraformOutputs};
pub use terraform::{CommandOutput, TerraformCli, TerraformRunner};
