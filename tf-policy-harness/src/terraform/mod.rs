//! Terraform process execution.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::config::TERRAFORM_BINARY_ENV;
use crate::errors::{HarnessError, Result};

/// Scoped apply with guaranteed destroy
pub mod apply;

/// `terraform output -json` model
pub mod output;

/// Captured result of one terraform invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with status 0
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

/// Runs terraform subcommands inside a module directory.
pub trait TerraformRunner {
    /// Runs `terraform <args>` with `dir` as the working directory.
    ///
    /// Implementations return `Ok` for any process that ran to completion,
    /// whatever its exit status; [`run_checked`] turns a failing status into an error.
    fn run(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs a terraform subcommand and fails on a non-zero exit status.
pub fn run_checked<R: TerraformRunner + ?Sized>(
    runner: &R,
    dir: &Path,
    args: &[&str],
) -> Result<CommandOutput> {
    let output = runner.run(dir, args)?;
    if output.success() {
        Ok(output)
    } else {
        Err(HarnessError::terraform_command(
            render_command(args),
            output.status,
            output.stderr.trim(),
        ))
    }
}

/// Renders a subcommand for logs and errors.
#[must_use]
pub fn render_command(args: &[&str]) -> String {
    std::iter::once("terraform")
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The `terraform` executable.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: PathBuf,
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new("terraform")
    }
}

impl TerraformCli {
    /// Uses `binary`, resolved through `PATH` when it is a bare name.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Uses `TERRAFORM_BINARY` when set, `terraform` otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var_os(TERRAFORM_BINARY_ENV)
            .filter(|v| !v.is_empty())
            .map_or_else(Self::default, Self::new)
    }

    /// The executable this runner spawns.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl TerraformRunner for TerraformCli {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        let rendered = render_command(args);
        info!("Running `{}` in {:?}", rendered, dir);

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| HarnessError::terraform_launch(&rendered, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!("`{}` stdout: {}", rendered, stdout);
        if !stderr.is_empty() {
            debug!("`{}` stderr: {}", rendered, stderr);
        }

        Ok(CommandOutput {
            status: output.status.code(),
            stdout,
            stderr,
        })
    }
}
