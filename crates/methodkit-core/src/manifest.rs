//! The `.installed.yaml` manifest tracks which skills and processes a project
//! installed from a methodology source, with checksums for drift detection.

use crate::error::Result;
use crate::io::atomic_write;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub version: String,
    pub checksum: String,
    pub modified: bool,
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub version: String,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub methodology: String,
    pub bundle: String,
    pub initialized_at: DateTime<Utc>,
    pub methodology_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology_path: Option<String>,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillEntry>,
    #[serde(default)]
    pub processes: BTreeMap<String, ProcessEntry>,
}

impl Manifest {
    pub fn new(methodology: &str, bundle: &str, methodology_version: &str) -> Self {
        Manifest {
            version: "1.0.0".to_string(),
            methodology: methodology.to_string(),
            bundle: bundle.to_string(),
            initialized_at: Utc::now(),
            methodology_version: methodology_version.to_string(),
            methodology_path: None,
            skills: BTreeMap::new(),
            processes: BTreeMap::new(),
        }
    }
}

/// Read the project manifest, migrating a legacy `manifest.yaml` in place.
///
/// Legacy project manifests (those with `methodology` and `bundle` fields and
/// no `type` field, which marks a monorepo manifest) are renamed to
/// `.installed.yaml` on first read. Returns `None` when no manifest exists.
pub fn read_manifest(root: &Path) -> Result<Option<Manifest>> {
    let path = paths::manifest_path(root);
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        return Ok(Some(serde_yaml::from_str(&content)?));
    }

    let legacy = paths::legacy_manifest_path(root);
    if legacy.exists() {
        let content = std::fs::read_to_string(&legacy)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&content)?;
        let is_project_manifest = value.get("methodology").is_some()
            && value.get("bundle").is_some()
            && value.get("type").is_none();
        if is_project_manifest {
            std::fs::rename(&legacy, &path)?;
            info!("migrated manifest.yaml to .installed.yaml");
            return Ok(Some(serde_yaml::from_value(value)?));
        }
    }

    Ok(None)
}

pub fn write_manifest(root: &Path, manifest: &Manifest) -> Result<()> {
    let content = serde_yaml::to_string(manifest)?;
    atomic_write(&paths::manifest_path(root), content.as_bytes())
}

// ---------------------------------------------------------------------------
// Checksums
// ---------------------------------------------------------------------------

fn format_digest(digest: &[u8]) -> String {
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{}", &hex[..12])
}

/// Truncated checksum of a single file's bytes.
pub fn checksum_file(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    Ok(format_digest(&Sha256::digest(&content)))
}

/// Truncated checksum over a directory: file contents hashed in sorted
/// relative-path order, so the result is stable across filesystems.
pub fn checksum_dir(dir: &Path) -> Result<String> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(std::fs::read(&file)?);
    }
    Ok(format_digest(&hasher.finalize()))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), out)?;
        } else {
            out.push(entry.path());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
