use anyhow::{bail, Context};
use methodkit_core::manifest::{self, Manifest, ProcessEntry, SkillEntry};
use methodkit_core::{io, paths, MethodError};
use std::path::{Path, PathBuf};

pub fn run(root: &Path, component: &str, all: bool) -> anyhow::Result<()> {
    let mut m = manifest::read_manifest(root)?.ok_or(MethodError::NotInitialized)?;
    let source_root = m
        .methodology_path
        .clone()
        .map(PathBuf::from)
        .context("no methodology_path in manifest; re-run 'methodkit init --source <path>'")?;

    if all {
        install_all(root, &mut m, &source_root, component)
    } else {
        install_single(root, &mut m, &source_root, component).map_err(Into::into)
    }
}

fn parse_kind(kind: &str) -> Result<ComponentKind, MethodError> {
    match kind {
        "skills" => Ok(ComponentKind::Skill),
        "processes" => Ok(ComponentKind::Process),
        other => Err(MethodError::InvalidComponentType(other.to_string())),
    }
}

#[derive(Clone, Copy)]
enum ComponentKind {
    Skill,
    Process,
}

fn install_single(
    root: &Path,
    m: &mut Manifest,
    source_root: &Path,
    component: &str,
) -> Result<(), MethodError> {
    let parts: Vec<&str> = component.split('/').collect();
    let [ns, kind, id] = parts.as_slice() else {
        return Err(MethodError::InvalidComponentPath(component.to_string()));
    };
    paths::validate_namespace(ns)?;

    match parse_kind(kind)? {
        ComponentKind::Skill => install_skill(root, m, source_root, ns, id),
        ComponentKind::Process => install_process(root, m, source_root, ns, id),
    }
}

fn install_skill(
    root: &Path,
    m: &mut Manifest,
    source_root: &Path,
    ns: &str,
    id: &str,
) -> Result<(), MethodError> {
    if m.skills.contains_key(id) {
        return Err(MethodError::AlreadyInstalled(id.to_string()));
    }
    let source = paths::skills_dir(source_root, ns).join(id);
    if !source.is_dir() {
        return Err(MethodError::ComponentNotFound(format!("{ns}/skills/{id}")));
    }

    let dest = paths::installed_skills_dir(root).join(id);
    io::copy_dir(&source, &dest)?;
    let checksum = manifest::checksum_dir(&dest)?;

    m.skills.insert(
        id.to_string(),
        SkillEntry {
            version: m.methodology_version.clone(),
            checksum,
            modified: false,
            source_path: format!("namespaces/{ns}/skills/{id}"),
        },
    );
    manifest::write_manifest(root, m)?;
    println!("  ✓ Installed {id} ({})", m.methodology_version);
    Ok(())
}

fn install_process(
    root: &Path,
    m: &mut Manifest,
    source_root: &Path,
    ns: &str,
    id: &str,
) -> Result<(), MethodError> {
    if m.processes.contains_key(id) {
        return Err(MethodError::AlreadyInstalled(id.to_string()));
    }
    let source = paths::processes_dir(source_root, ns).join(format!("{id}.json"));
    if !source.is_file() {
        return Err(MethodError::ComponentNotFound(format!(
            "{ns}/processes/{id}"
        )));
    }

    let dest = paths::installed_processes_dir(root).join(format!("{id}.json"));
    io::ensure_dir(&paths::installed_processes_dir(root))?;
    std::fs::copy(&source, &dest)?;
    let checksum = manifest::checksum_file(&dest)?;

    m.processes.insert(
        id.to_string(),
        ProcessEntry {
            version: m.methodology_version.clone(),
            checksum,
        },
    );
    manifest::write_manifest(root, m)?;
    println!("  ✓ Installed {id} ({})", m.methodology_version);
    Ok(())
}

fn install_all(
    root: &Path,
    m: &mut Manifest,
    source_root: &Path,
    component: &str,
) -> anyhow::Result<()> {
    let parts: Vec<&str> = component.split('/').collect();
    let [ns, kind] = parts.as_slice() else {
        bail!("invalid path '{component}': expected namespace/type with --all");
    };
    paths::validate_namespace(ns)?;
    let kind_parsed = parse_kind(kind)?;

    let source_dir = match kind_parsed {
        ComponentKind::Skill => paths::skills_dir(source_root, ns),
        ComponentKind::Process => paths::processes_dir(source_root, ns),
    };
    if !source_dir.is_dir() {
        bail!("not found: {}", source_dir.display());
    }

    let mut installed = 0usize;
    let mut skipped = 0usize;
    let mut entries: Vec<_> = std::fs::read_dir(&source_dir)?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let id = match kind_parsed {
            ComponentKind::Skill => {
                if !entry.path().is_dir() {
                    continue;
                }
                name
            }
            ComponentKind::Process => match name.strip_suffix(".json") {
                Some(stem) if !stem.contains(".schema") => stem.to_string(),
                _ => continue,
            },
        };

        let result = match kind_parsed {
            ComponentKind::Skill => install_skill(root, m, source_root, ns, &id),
            ComponentKind::Process => install_process(root, m, source_root, ns, &id),
        };
        match result {
            Ok(()) => installed += 1,
            Err(MethodError::AlreadyInstalled(_)) => {
                println!("  - Skipped {id} (already installed)");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("\nInstalled: {installed}, Skipped: {skipped}");
    Ok(())
}
