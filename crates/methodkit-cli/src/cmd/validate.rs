use crate::output;
use anyhow::{bail, Context};
use methodkit_core::{namespace, validate};
use std::path::Path;

pub fn run(root: &Path, ns: &str, strict: bool, json: bool) -> anyhow::Result<()> {
    if !namespace::namespace_exists(root, ns) {
        let available = namespace::available_namespaces(root)?;
        bail!(
            "namespace '{ns}' not found (available: {})",
            available.join(", ")
        );
    }

    let methodology = namespace::load_methodology(root, ns)
        .with_context(|| format!("failed to load methodology for '{ns}'"))?;

    let report = validate::validate(&methodology);

    if json {
        output::print_json(&report)?;
    } else {
        println!("Validating methodology for namespace: {ns}\n");

        if !report.errors.is_empty() {
            println!("ERRORS:");
            for error in &report.errors {
                println!("  ✗ {error}");
            }
            println!();
        }

        if !report.warnings.is_empty() {
            println!("WARNINGS:");
            for warning in &report.warnings {
                println!("  ⚠ {warning}");
            }
            println!();
        }

        let status = if !report.errors.is_empty() {
            "✗ INVALID"
        } else if !report.warnings.is_empty() {
            "⚠ VALID with warnings"
        } else {
            "✓ VALID"
        };
        println!("Status: {status}");
        println!("  Errors:   {}", report.errors.len());
        println!("  Warnings: {}", report.warnings.len());

        if strict && !report.warnings.is_empty() {
            println!("\nNote: strict mode treats warnings as errors");
        }
    }

    if !report.valid {
        bail!("validation failed with {} error(s)", report.errors.len());
    }
    if strict && !report.warnings.is_empty() {
        bail!(
            "validation failed in strict mode with {} warning(s)",
            report.warnings.len()
        );
    }
    Ok(())
}
