//! Namespace discovery and document loading. Every function takes the project
//! root explicitly; locating the root is the caller's job.

use crate::error::{MethodError, Result};
use crate::paths;
use crate::types::{ConcreteProcess, Methodology};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn available_namespaces(root: &Path) -> Result<Vec<String>> {
    let dir = paths::namespaces_dir(root);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut namespaces: Vec<String> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    namespaces.sort();
    Ok(namespaces)
}

pub fn namespace_exists(root: &Path, namespace: &str) -> bool {
    paths::namespace_dir(root, namespace).is_dir()
}

/// Resolve the methodology document for a namespace, trying the namespace
/// directory first and the extracted copy under `meta/generated/` second.
pub fn find_methodology_path(root: &Path, namespace: &str) -> Option<PathBuf> {
    let candidates = [
        paths::methodology_path(root, namespace),
        paths::generated_methodology_path(root, namespace),
    ];
    candidates.into_iter().find(|p| p.exists())
}

pub fn load_methodology(root: &Path, namespace: &str) -> Result<Methodology> {
    paths::validate_namespace(namespace)?;
    if !namespace_exists(root, namespace) {
        return Err(MethodError::NamespaceNotFound(namespace.to_string()));
    }
    let path = find_methodology_path(root, namespace)
        .ok_or_else(|| MethodError::MethodologyNotFound(namespace.to_string()))?;
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Load all persisted process files under `namespaces/<ns>/processes/`.
///
/// Schema files (`*.schema.*`) and JSON documents that do not look like a
/// process (no `process_id` string plus `phases` array) are skipped; parse
/// failures are logged and skipped so one corrupt file never blocks the rest.
pub fn load_processes(root: &Path, namespace: &str) -> Result<Vec<ConcreteProcess>> {
    let dir = paths::processes_dir(root, namespace);
    if !dir.exists() {
        warn!(dir = %dir.display(), "processes directory not found");
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.contains(".schema."))
        })
        .collect();
    files.sort();

    let mut processes = Vec::new();
    for path in files {
        let content = std::fs::read_to_string(&path)?;
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                warn!(file = %path.display(), %err, "failed to parse process file, skipping");
                continue;
            }
        };
        if !looks_like_process(&value) {
            warn!(file = %path.display(), "not a process definition, skipping");
            continue;
        }
        match serde_json::from_value::<ConcreteProcess>(value) {
            Ok(process) => processes.push(process),
            Err(err) => {
                warn!(file = %path.display(), %err, "failed to parse process file, skipping");
            }
        }
    }
    Ok(processes)
}

fn looks_like_process(value: &serde_json::Value) -> bool {
    value.get("process_id").is_some_and(|v| v.is_string())
        && value.get("phases").is_some_and(|v| v.is_array())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
