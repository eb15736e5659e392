use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::debug;
use tf_policy_harness::config::{parse_bool, DEFAULT_AWS_REGION, KEEP_AFTER_ENV};
use tf_policy_harness::{
    check_module, prepare_module, HarnessError, ProviderVersion, TerraformCli, TestParameters,
};

mod output;

#[derive(Parser, Debug)]
#[command(name = "tf-policy-harness", version, about = "Prepare, apply and check the IAM policy Terraform module")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ModuleArgs {
    /// Terraform directory of the module under test
    #[arg(long, default_value = "test_data/test_module")]
    module_dir: PathBuf,

    /// AWS region written into terraform.tfvars
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_AWS_REGION)]
    region: String,

    /// Role ARN for the AWS provider to assume
    #[arg(long, env = "TEST_ROLE_ARN")]
    role_arn: Option<String>,
}

impl ModuleArgs {
    fn parameters(&self, provider_version: ProviderVersion) -> TestParameters {
        TestParameters::new(
            self.region.clone(),
            self.role_arn.clone().filter(|arn| !arn.trim().is_empty()),
            provider_version,
        )
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clear stale terraform state and write terraform.tfvars and terraform.tf
    WriteFixtures {
        #[command(flatten)]
        module: ModuleArgs,

        /// AWS provider version: aws-5 (~> 5.62) or aws-6 (~> 6.0)
        #[arg(long, value_parser = parse_provider_version)]
        provider_version: ProviderVersion,
    },

    /// Apply the module, check its policy_json output, then destroy it
    Check {
        #[command(flatten)]
        module: ModuleArgs,

        /// Provider versions to check; all supported versions when omitted
        #[arg(long = "provider-version", value_parser = parse_provider_version)]
        provider_versions: Vec<ProviderVersion>,

        /// Leave the resources in place after the check (1/0/true/false/yes/no)
        #[arg(
            long,
            env = "KEEP_AFTER",
            action = ArgAction::Set,
            num_args = 0..=1,
            default_missing_value = "true",
            default_value = "false",
            value_parser = parse_keep_after
        )]
        keep_after: bool,

        /// Terraform executable
        #[arg(long, env = "TERRAFORM_BINARY", default_value = "terraform")]
        terraform: PathBuf,

        /// Print the reports as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Pretty-print the JSON reports (implies --json)
        #[arg(long)]
        pretty: bool,
    },
}

fn parse_provider_version(s: &str) -> std::result::Result<ProviderVersion, String> {
    s.parse().map_err(|e: HarnessError| e.to_string())
}

fn parse_keep_after(s: &str) -> std::result::Result<bool, String> {
    parse_bool(KEEP_AFTER_ENV, s).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("Parsed arguments: {:?}", cli);

    match cli.command {
        Commands::WriteFixtures {
            module,
            provider_version,
        } => {
            let params = module.parameters(provider_version);
            prepare_module(&module.module_dir, &params).with_context(|| {
                format!("Failed to write fixtures in {}", module.module_dir.display())
            })?;
            output::note(&format!(
                "wrote fixtures for {} ({}) in {}",
                provider_version,
                provider_version.constraint(),
                module.module_dir.display()
            ));
            Ok(())
        }
        Commands::Check {
            module,
            provider_versions,
            keep_after,
            terraform,
            json,
            pretty,
        } => {
            let versions = if provider_versions.is_empty() {
                ProviderVersion::ALL.to_vec()
            } else {
                provider_versions
            };
            let runner = TerraformCli::new(terraform);

            let mut reports = Vec::new();
            let mut failed = Vec::new();
            for version in versions {
                let params = module.parameters(version);
                match check_module(&runner, &module.module_dir, &params, keep_after) {
                    Ok(report) => {
                        output::print_check_passed(&report);
                        reports.push(report);
                    }
                    Err(e) => {
                        output::print_check_failed(version, &e);
                        failed.push(version);
                    }
                }
            }

            if json || pretty {
                output::output_reports(&reports, pretty)?;
            }
            if keep_after {
                output::warn("resources were kept; run `terraform destroy` in the module directory when done");
            }
            if !failed.is_empty() {
                let ids = failed.iter().map(ToString::to_string).collect::<Vec<_>>();
                bail!("module check failed for: {}", ids.join(", "));
            }
            Ok(())
        }
    }
}
