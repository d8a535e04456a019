use crate::output;
use anyhow::{bail, Context};
use methodkit_core::namespace;
use methodkit_core::sync::{self, Severity};
use serde_json::Value;
use std::path::Path;

pub fn run(root: &Path, ns: &str, verbose: bool, json: bool) -> anyhow::Result<()> {
    if !namespace::namespace_exists(root, ns) {
        let available = namespace::available_namespaces(root)?;
        bail!(
            "namespace '{ns}' not found (available: {})",
            available.join(", ")
        );
    }

    let methodology = namespace::load_methodology(root, ns)
        .with_context(|| format!("failed to load methodology for '{ns}'"))?;
    if methodology.processes.is_empty() {
        bail!("no processes defined in the methodology document");
    }

    let persisted = namespace::load_processes(root, ns)?;
    let report = sync::sync_check(&methodology, &persisted);

    if json {
        output::print_json(&report)?;
    } else {
        println!("Checking sync between methodology.yaml and processes/*.json\n");

        for (process_id, issues) in report.grouped() {
            println!("{process_id}:");
            if issues.is_empty() {
                println!("  ✓ In sync");
                continue;
            }
            for issue in issues {
                let icon = match issue.severity {
                    Severity::Error => "✗",
                    Severity::Warning => "⚠",
                };
                let location = issue
                    .phase_id
                    .as_deref()
                    .map(|p| format!("[{p}] "))
                    .unwrap_or_default();
                if verbose {
                    println!("  {icon} {location}{}:", issue.field);
                    println!("      expected: {}", format_value(&issue.expected));
                    println!("      actual:   {}", format_value(&issue.actual));
                } else {
                    println!("  {icon} {location}{} mismatch", issue.field);
                }
            }
        }

        println!();
        if report.issues.is_empty() {
            println!("✓ All processes in sync with methodology.yaml");
        } else {
            println!(
                "Status: {} error(s), {} warning(s)",
                report.error_count(),
                report.warning_count()
            );
        }
    }

    if report.has_errors() {
        bail!(
            "sync check found {} error(s); run 'methodkit generate {ns}' to regenerate",
            report.error_count()
        );
    }
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().take(3).map(format_value).collect();
            if items.len() > 3 {
                format!("[{}, ...]", rendered.join(", "))
            } else {
                format!("[{}]", rendered.join(", "))
            }
        }
        other => other.to_string(),
    }
}
