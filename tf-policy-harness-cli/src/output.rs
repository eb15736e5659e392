use anyhow::{Context, Result};
use log::debug;
use std::io::{self, Write};
use tf_policy_harness::{HarnessError, ModuleCheckReport, ProviderVersion};

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "tf-policy-harness: {}", msg);
}

pub(crate) fn warn(msg: &str) {
    let _ = writeln!(io::stderr(), "tf-policy-harness (warning): {}", msg);
}

pub(crate) fn print_check_passed(report: &ModuleCheckReport) {
    let _ = writeln!(
        io::stderr(),
        "PASS {} ({}): policy_json has {} statement(s){}",
        report.provider_version,
        report.provider_constraint,
        report.statement_count,
        if report.kept { ", resources kept" } else { "" }
    );
}

pub(crate) fn print_check_failed(version: ProviderVersion, error: &HarnessError) {
    let stderr = io::stderr();
    let mut w = stderr.lock();
    let _ = writeln!(w, "FAIL {} ({})", version, version.constraint());
    let _ = writeln!(w, "  {}", error);
    if error.is_policy_assertion() {
        let _ = writeln!(
            w,
            "  The module applied but its policy_json output did not pass the checks."
        );
    }
}

/// Output check reports as JSON to stdout
pub(crate) fn output_reports(reports: &[ModuleCheckReport], pretty: bool) -> Result<()> {
    debug!("Formatting check reports as JSON (pretty: {})", pretty);

    let json_output = if pretty {
        serde_json::to_string_pretty(reports)
            .context("Failed to serialize check reports to pretty JSON")?
    } else {
        serde_json::to_string(reports).context("Failed to serialize check reports to JSON")?
    };

    print!("{}", json_output);
    if pretty {
        println!();
    }
    Ok(())
}
