use crate::output;
use anyhow::Result;
use methodkit_core::manifest::{self, Manifest};
use methodkit_core::{paths, MethodError};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ComponentStatus {
    name: String,
    version: String,
    missing: bool,
    modified: bool,
}

#[derive(Serialize)]
struct StatusReport {
    methodology: String,
    bundle: String,
    methodology_version: String,
    initialized_at: String,
    skills: Vec<ComponentStatus>,
    processes: Vec<ComponentStatus>,
}

pub fn run(root: &Path, json: bool) -> Result<()> {
    let m = manifest::read_manifest(root)?.ok_or(MethodError::NotInitialized)?;
    let report = build_report(root, &m)?;

    if json {
        output::print_json(&report)?;
        return Ok(());
    }

    println!("Methodology Status");
    println!("{}", "-".repeat(40));
    println!("Namespace:   {}", report.methodology);
    println!("Bundle:      {}", report.bundle);
    println!("Version:     {}", report.methodology_version);
    println!("Initialized: {}", report.initialized_at);
    if let Some(source) = &m.methodology_path {
        println!("Source:      {source}");
    }

    print_components("Skills", &report.skills);
    print_components("Processes", &report.processes);
    Ok(())
}

fn build_report(root: &Path, m: &Manifest) -> Result<StatusReport> {
    let mut skills = Vec::new();
    for (name, entry) in &m.skills {
        let path = paths::installed_skills_dir(root).join(name);
        let (missing, modified) = if !path.is_dir() {
            (true, false)
        } else {
            let drifted = entry.modified
                || manifest::checksum_dir(&path)
                    .map(|c| c != entry.checksum)
                    .unwrap_or(true);
            (false, drifted)
        };
        skills.push(ComponentStatus {
            name: name.clone(),
            version: entry.version.clone(),
            missing,
            modified,
        });
    }

    let mut processes = Vec::new();
    for (name, entry) in &m.processes {
        let path = paths::installed_processes_dir(root).join(format!("{name}.json"));
        let (missing, modified) = if !path.is_file() {
            (true, false)
        } else {
            let drifted = manifest::checksum_file(&path)
                .map(|c| c != entry.checksum)
                .unwrap_or(true);
            (false, drifted)
        };
        processes.push(ComponentStatus {
            name: name.clone(),
            version: entry.version.clone(),
            missing,
            modified,
        });
    }

    Ok(StatusReport {
        methodology: m.methodology.clone(),
        bundle: m.bundle.clone(),
        methodology_version: m.methodology_version.clone(),
        initialized_at: m.initialized_at.to_rfc3339(),
        skills,
        processes,
    })
}

fn print_components(label: &str, components: &[ComponentStatus]) {
    println!("\n{label} ({}):", components.len());
    if components.is_empty() {
        println!("  (none installed)");
        return;
    }
    for c in components {
        if c.missing {
            println!("  ✗ {} (missing)", c.name);
        } else if c.modified {
            println!("  ~ {} ({}) [modified]", c.name, c.version);
        } else {
            println!("  ✓ {} ({})", c.name, c.version);
        }
    }
}
