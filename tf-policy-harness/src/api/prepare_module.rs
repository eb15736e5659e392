use std::path::{Path, PathBuf};

use crate::config::{TestParameters, TERRAFORM_ROOT_DIR, TEST_MODULE_NAME};
use crate::errors::Result;
use crate::fixtures::write_fixtures;

/// `test_data/test_module` under `repo_root`.
#[must_use]
pub fn default_module_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(TERRAFORM_ROOT_DIR).join(TEST_MODULE_NAME)
}

/// Clears stale terraform state in `module_dir` and writes fresh fixtures.
pub fn prepare_module(module_dir: &Path, params: &TestParameters) -> Result<()> {
    write_fixtures(module_dir, params)
}
