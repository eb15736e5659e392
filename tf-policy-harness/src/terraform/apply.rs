//! `terraform apply` as a scoped resource.
//!
//! [`TerraformApply`] provisions the module when it is created and destroys it
//! when it goes away: through [`TerraformApply::finish`], on drop after an
//! error, or during unwinding after a failed assertion. Destroy is skipped
//! only when [`ApplyOptions::destroy_after`] is false.

use std::path::{Path, PathBuf};

use log::{error, info};

use crate::errors::Result;
use crate::terraform::output::TerraformOutputs;
use crate::terraform::{run_checked, TerraformRunner};

const INIT_ARGS: &[&str] = &["init", "-input=false", "-no-color"];
const APPLY_ARGS: &[&str] = &[
    "apply",
    "-var-file=terraform.tfvars",
    "-input=false",
    "-auto-approve",
    "-no-color",
];
const OUTPUT_ARGS: &[&str] = &["output", "-json"];
const DESTROY_ARGS: &[&str] = &[
    "destroy",
    "-var-file=terraform.tfvars",
    "-input=false",
    "-auto-approve",
    "-no-color",
];

/// How the module is applied and released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Run `terraform destroy` when the scope ends
    pub destroy_after: bool,
    /// Collect `terraform output -json` after apply
    pub json_output: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            destroy_after: true,
            json_output: true,
        }
    }
}

/// An applied module. Dropping it destroys the resources.
pub struct TerraformApply<'a, R: TerraformRunner + ?Sized> {
    runner: &'a R,
    module_dir: PathBuf,
    options: ApplyOptions,
    outputs: TerraformOutputs,
    released: bool,
}

impl<'a, R: TerraformRunner + ?Sized> TerraformApply<'a, R> {
    /// Runs `init`, `apply` and, with JSON output requested, `output -json`.
    ///
    /// If any step fails the resources are still destroyed (unless kept) and
    /// the step's error is returned as is.
    pub fn apply(
        runner: &'a R,
        module_dir: impl Into<PathBuf>,
        options: ApplyOptions,
    ) -> Result<Self> {
        let mut guard = Self {
            runner,
            module_dir: module_dir.into(),
            options,
            outputs: TerraformOutputs::default(),
            released: false,
        };
        // on error the guard drops here and tears down
        guard.provision()?;
        Ok(guard)
    }

    fn provision(&mut self) -> Result<()> {
        info!("Applying terraform module in {:?}", self.module_dir);
        run_checked(self.runner, &self.module_dir, INIT_ARGS)?;
        run_checked(self.runner, &self.module_dir, APPLY_ARGS)?;

        if self.options.json_output {
            let output = run_checked(self.runner, &self.module_dir, OUTPUT_ARGS)?;
            self.outputs = TerraformOutputs::parse(&output.stdout)?;
        }
        Ok(())
    }

    /// Outputs collected after apply. Empty unless JSON output was requested.
    #[must_use]
    pub fn outputs(&self) -> &TerraformOutputs {
        &self.outputs
    }

    /// Directory the module was applied in.
    #[must_use]
    pub fn module_dir(&self) -> &Path {
        &self.module_dir
    }

    /// Ends the scope now and reports a destroy failure.
    pub fn finish(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        if !self.options.destroy_after {
            info!(
                "Keeping terraform resources in {:?}; destroy them manually",
                self.module_dir
            );
            return Ok(());
        }

        info!("Destroying terraform module in {:?}", self.module_dir);
        run_checked(self.runner, &self.module_dir, DESTROY_ARGS).map(|_| ())
    }
}

impl<R: TerraformRunner + ?Sized> Drop for TerraformApply<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            error!("Failed to destroy terraform module in {:?}: {}", self.module_dir, e);
        }
    }
}

/// Applies the module, runs `body` on its outputs, then releases it.
///
/// Returns the body's error if it failed. If the body succeeded but destroy
/// failed, the destroy error is returned instead.
pub fn with_terraform_apply<R, T, F>(
    runner: &R,
    module_dir: impl Into<PathBuf>,
    options: ApplyOptions,
    body: F,
) -> Result<T>
where
    R: TerraformRunner + ?Sized,
    F: FnOnce(&TerraformOutputs) -> Result<T>,
{
    let guard = TerraformApply::apply(runner, module_dir, options)?;
    let value = body(guard.outputs())?;
    guard.finish()?;
    Ok(value)
}
