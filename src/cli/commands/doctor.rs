//! CLI command for `scratchroot doctor`
//!
//! Checks host tools and privileges, reporting issues with suggestions.

use anyhow::Result;

use crate::cli::output::{
    create_spinner, is_json, is_quiet, print_detail, print_info, print_success, status,
};
use crate::core::doctor::run_doctor;

/// Execute the doctor command
pub async fn execute() -> Result<()> {
    let report = if is_quiet() || is_json() {
        run_doctor()
    } else {
        let spinner = create_spinner("Probing host tools...");
        let report = run_doctor();
        spinner.finish_and_clear();
        report
    };

    if is_json() {
        let json_result = serde_json::json!({
            "status": if report.all_passed() {
                "success"
            } else if report.failed_required().is_empty() {
                "warning"
            } else {
                "error"
            },
            "checks": report.checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "passed": c.passed,
                "required": c.required,
                "version": c.version,
                "error": c.error,
                "suggestion": c.suggestion
            })).collect::<Vec<_>>(),
            "passed_count": report.passed_count(),
            "total_count": report.checks.len()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json_result).unwrap_or_default()
        );

        if !report.failed_required().is_empty() {
            return Err(anyhow::anyhow!("Missing required host tools"));
        }
        return Ok(());
    }

    if is_quiet() {
        let failed_required = report.failed_required();
        if !failed_required.is_empty() {
            for check in failed_required {
                eprintln!("{} Missing required: {}", status::ERROR, check.name);
            }
            return Err(anyhow::anyhow!("Missing required host tools"));
        }
        return Ok(());
    }

    print_info("Checking host tools...");
    println!();

    for check in &report.checks {
        let version_str = check
            .version
            .as_ref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default();

        let required_str = if check.required { "" } else { " [optional]" };

        if check.passed {
            println!(
                "  {} {}{version_str}{required_str}",
                status::SUCCESS,
                check.name
            );
        } else {
            println!("  {} {}{required_str}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    println!();
    let passed = report.passed_count();
    let total = report.checks.len();
    let failed_required = report.failed_required();

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
        print_detail("Host is ready to build a system.");
    } else if failed_required.is_empty() {
        print_info(&format!(
            "{passed}/{total} checks passed (optional tools missing)"
        ));
    } else {
        println!("{} {passed}/{total} checks passed", status::ERROR);
        print_detail("Install the missing required tools:");
        for check in &failed_required {
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("• {}: {suggestion}", check.name));
            }
        }
        return Err(anyhow::anyhow!(
            "Missing required host tools. Run 'scratchroot doctor' for details."
        ));
    }

    Ok(())
}
