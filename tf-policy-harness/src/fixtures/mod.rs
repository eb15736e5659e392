//! Terraform fixture files for the module under test.
//!
//! Every run starts from a clean working directory: the provider cache and the
//! dependency lock file are removed, then `terraform.tfvars` and `terraform.tf`
//! are rewritten from the test parameters.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};

use crate::config::{ProviderVersion, TestParameters};
use crate::errors::{HarnessError, Result};

/// Variable assignments file
pub const TFVARS_FILE: &str = "terraform.tfvars";
/// Version constraints file
pub const VERSIONS_FILE: &str = "terraform.tf";
/// Working directory created by `terraform init`
pub const STATE_DIR: &str = ".terraform";
/// Dependency lock file created by `terraform init`
pub const LOCK_FILE: &str = ".terraform.lock.hcl";

/// Terraform core version the module requires
pub const REQUIRED_TERRAFORM_VERSION: &str = "~> 1.5";
/// Registry source of the AWS provider
pub const AWS_PROVIDER_SOURCE: &str = "hashicorp/aws";

/// Removes `.terraform/` and `.terraform.lock.hcl` from `module_dir`.
///
/// Missing entries are fine; any other filesystem error is returned.
pub fn clean_state(module_dir: &Path) -> Result<()> {
    for name in [STATE_DIR, LOCK_FILE] {
        let path = module_dir.join(name);
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(HarnessError::file_system("inspect", &path, e)),
        };

        let (operation, removed) = if metadata.is_dir() {
            ("remove directory", fs::remove_dir_all(&path))
        } else {
            ("remove file", fs::remove_file(&path))
        };

        match removed {
            Ok(()) => debug!("Removed stale terraform state {:?}", path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(HarnessError::file_system(operation, &path, e)),
        }
    }
    Ok(())
}

/// Renders `terraform.tfvars`. The `role_arn` line is present only when a role was given.
#[must_use]
pub fn render_tfvars(params: &TestParameters) -> String {
    let mut out = format!("region = {}\n", hcl_quote(&params.region));
    if let Some(role_arn) = &params.role_arn {
        out.push_str(&format!("role_arn = {}\n", hcl_quote(role_arn)));
    }
    out
}

/// Renders the `terraform { ... }` block pinning core and provider versions.
#[must_use]
pub fn render_terraform_tf(provider_version: ProviderVersion) -> String {
    format!(
        r#"terraform {{
  required_version = {core}
  required_providers {{
    aws = {{
      source  = {source}
      version = {provider}
    }}
  }}
}}
"#,
        core = hcl_quote(REQUIRED_TERRAFORM_VERSION),
        source = hcl_quote(AWS_PROVIDER_SOURCE),
        provider = hcl_quote(provider_version.constraint()),
    )
}

/// Cleans stale state, then (re)writes both fixture files in `module_dir`.
pub fn write_fixtures(module_dir: &Path, params: &TestParameters) -> Result<()> {
    info!(
        "Writing terraform fixtures in {:?} (region: {}, role: {}, provider: {})",
        module_dir,
        params.region,
        params.role_arn.as_deref().unwrap_or("<none>"),
        params.provider_version.constraint()
    );

    clean_state(module_dir)?;
    write_file(&module_dir.join(TFVARS_FILE), &render_tfvars(params))?;
    write_file(
        &module_dir.join(VERSIONS_FILE),
        &render_terraform_tf(params.provider_version),
    )
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| HarnessError::file_system("write", path, e))
}

/// Quotes `value` as an HCL string literal.
///
/// Backslashes and quotes are escaped, and `${` / `%{` are doubled so the
/// value is never read as a template interpolation or directive.
fn hcl_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn params(role_arn: Option<&str>) -> TestParameters {
        TestParameters::new(
            "us-east-1".to_string(),
            role_arn.map(str::to_string),
            ProviderVersion::Aws6,
        )
    }

    #[test]
    fn test_tfvars_without_role_arn() {
        let rendered = render_tfvars(&params(None));
        assert_eq!(rendered, "region = \"us-east-1\"\n");
        assert!(!rendered.contains("role_arn"));
    }

    #[test]
    fn test_tfvars_with_role_arn() {
        let rendered = render_tfvars(&params(Some("arn:aws:iam::123456789012:role/tester")));
        let role_lines: Vec<_> = rendered
            .lines()
            .filter(|l| l.trim_start().starts_with("role_arn"))
            .collect();
        assert_eq!(
            role_lines,
            vec!["role_arn = \"arn:aws:iam::123456789012:role/tester\""]
        );
        assert!(rendered.contains("region = \"us-east-1\""));
    }

    #[test]
    fn test_terraform_tf_pins_versions() {
        let rendered = render_terraform_tf(ProviderVersion::Aws6);
        assert!(rendered.starts_with("terraform {"));
        assert!(rendered.contains("required_version = \"~> 1.5\""));
        assert!(rendered.contains("source  = \"hashicorp/aws\""));
        assert!(rendered.contains("version = \"~> 6.0\""));

        let rendered = render_terraform_tf(ProviderVersion::Aws5);
        assert!(rendered.contains("version = \"~> 5.62\""));
    }

    #[test]
    fn test_hcl_quote_escapes() {
        assert_eq!(hcl_quote("plain"), "\"plain\"");
        assert_eq!(hcl_quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(hcl_quote("${var.x}"), "\"$${var.x}\"");
        assert_eq!(hcl_quote("%{if}"), "\"%%{if}\"");
        assert_eq!(hcl_quote("cost $5"), "\"cost $5\"");
    }

    #[test]
    fn test_clean_state_tolerates_missing_entries() {
        let dir = TempDir::new().unwrap();
        clean_state(dir.path()).unwrap();
    }

    #[test]
    fn test_clean_state_removes_stale_state() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join(STATE_DIR);
        fs::create_dir_all(state.join("providers/registry.terraform.io")).unwrap();
        fs::write(state.join("terraform.tfstate"), "{}").unwrap();
        fs::write(dir.path().join(LOCK_FILE), "# lock").unwrap();
        fs::write(dir.path().join("main.tf"), "# keep me").unwrap();

        clean_state(dir.path()).unwrap();

        assert!(!state.exists());
        assert!(!dir.path().join(LOCK_FILE).exists());
        assert!(dir.path().join("main.tf").exists());
    }

    #[test]
    fn test_write_fixtures_example_scenario() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(STATE_DIR)).unwrap();

        write_fixtures(dir.path(), &params(None)).unwrap();

        let tf = fs::read_to_string(dir.path().join(VERSIONS_FILE)).unwrap();
        let tfvars = fs::read_to_string(dir.path().join(TFVARS_FILE)).unwrap();
        assert!(tf.contains("version = \"~> 6.0\""));
        assert!(tfvars.contains("region = \"us-east-1\""));
        assert!(!tfvars.contains("role_arn"));
        assert!(!dir.path().join(STATE_DIR).exists());
    }

    #[test]
    fn test_write_fixtures_overwrites_previous_run() {
        let dir = TempDir::new().unwrap();
        write_fixtures(dir.path(), &params(Some("arn:aws:iam::1:role/old"))).unwrap();
        write_fixtures(dir.path(), &params(None)).unwrap();

        let tfvars = fs::read_to_string(dir.path().join(TFVARS_FILE)).unwrap();
        assert!(!tfvars.contains("role_arn"));
    }

    #[test]
    fn test_write_fixtures_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = write_fixtures(&missing, &params(None)).unwrap_err();
        assert!(matches!(err, HarnessError::FileSystem { ref operation, .. } if operation == "write"));
    }
}
