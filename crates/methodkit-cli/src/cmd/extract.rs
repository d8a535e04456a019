use anyhow::{bail, Context};
use methodkit_core::{defaults, namespace};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Serialize)]
struct ExtractOutput {
    phase_defaults: BTreeMap<String, methodkit_core::types::PhaseDefault>,
    processes: Vec<methodkit_core::types::Process>,
}

pub fn run(root: &Path, ns: &str, format: &str) -> anyhow::Result<()> {
    if !namespace::namespace_exists(root, ns) {
        let available = namespace::available_namespaces(root)?;
        bail!(
            "namespace '{ns}' not found (available: {})",
            available.join(", ")
        );
    }

    let persisted = namespace::load_processes(root, ns)
        .with_context(|| format!("failed to load processes for '{ns}'"))?;
    if persisted.is_empty() {
        bail!("no processes found in namespace '{ns}'");
    }

    let ids: Vec<&str> = persisted.iter().map(|p| p.process_id.as_str()).collect();
    println!("Found {} process(es): {}", persisted.len(), ids.join(", "));

    let extracted = defaults::extract_phase_defaults(&persisted);
    let processes = defaults::extract_processes(&persisted);

    println!(
        "\nExtracted defaults for {} phase(s):",
        extracted.defaults.len()
    );
    for (phase_id, default) in &extracted.defaults {
        let validators = default.validators.as_ref().map_or(0, Vec::len);
        let approval = default
            .approval_role
            .as_deref()
            .map(|r| format!(" (approval: {r})"))
            .unwrap_or_default();
        let used_in = extracted
            .used_in
            .get(phase_id)
            .map(|v| v.join(", "))
            .unwrap_or_default();
        println!("  - {phase_id}: {validators} validators{approval} [{used_in}]");
    }

    let output = ExtractOutput {
        phase_defaults: extracted.defaults,
        processes,
    };

    println!("\nAdd this to the methodology document:\n");
    match format {
        "yaml" => print!("{}", serde_yaml::to_string(&output)?),
        "json" => println!("{}", serde_json::to_string_pretty(&output)?),
        other => bail!("unknown format '{other}': expected yaml or json"),
    }
    Ok(())
}
