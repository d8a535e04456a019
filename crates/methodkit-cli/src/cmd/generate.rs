use anyhow::{bail, Context};
use methodkit_core::{generate, io, namespace, paths};
use std::path::Path;

pub fn run(
    root: &Path,
    ns: &str,
    output: Option<&Path>,
    dry_run: bool,
    force: bool,
) -> anyhow::Result<()> {
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
    if methodology.phase_defaults.is_empty() {
        println!("Warning: no phase_defaults defined, using empty defaults");
    }

    println!(
        "Generating {} process(es) from {} phase default(s)\n",
        methodology.processes.len(),
        methodology.phase_defaults.len()
    );

    let output_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths::processes_dir(root, ns));
    if !dry_run {
        io::ensure_dir(&output_dir)?;
    }

    let mut generated = 0usize;
    for process in &methodology.processes {
        let concrete = generate::generate_process(process, &methodology.phase_defaults);
        let filename = format!("{}.json", process.id);
        let path = output_dir.join(&filename);

        if dry_run {
            println!("--- {filename} ---");
            println!("{}\n", serde_json::to_string_pretty(&concrete)?);
            generated += 1;
            continue;
        }

        // A file marked "_generated": false was edited by hand; leave it
        // alone unless forced.
        if path.exists() && !force && is_manually_modified(&path)? {
            println!("  ⚠ Skipping {filename} (manually modified, use --force to overwrite)");
            continue;
        }

        let mut content = serde_json::to_string_pretty(&concrete)?;
        content.push('\n');
        io::atomic_write(&path, content.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  ✓ Generated {filename}");
        generated += 1;
    }

    if dry_run {
        println!("Dry run complete: {generated} process(es) would be generated");
    } else {
        println!(
            "\nGenerated {generated} process file(s) to {}",
            output_dir.display()
        );
    }
    Ok(())
}

fn is_manually_modified(path: &Path) -> anyhow::Result<bool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        // Unparseable existing file: treat as hand-edited.
        Err(_) => return Ok(true),
    };
    Ok(value.get("_generated") == Some(&serde_json::Value::Bool(false)))
}
