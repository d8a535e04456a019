use crate::error::{MethodError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NAMESPACES_DIR: &str = "namespaces";
pub const PROCESSES_DIR: &str = "processes";
pub const SKILLS_DIR: &str = "skills";
pub const GENERATED_DIR: &str = "meta/generated";

pub const METHODOLOGY_FILE: &str = "methodology.yaml";
pub const MANIFEST_FILE: &str = ".installed.yaml";
pub const LEGACY_MANIFEST_FILE: &str = "manifest.yaml";

pub const INSTALLED_SKILLS_DIR: &str = ".claude/skills";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn namespaces_dir(root: &Path) -> PathBuf {
    root.join(NAMESPACES_DIR)
}

pub fn namespace_dir(root: &Path, namespace: &str) -> PathBuf {
    namespaces_dir(root).join(namespace)
}

pub fn methodology_path(root: &Path, namespace: &str) -> PathBuf {
    namespace_dir(root, namespace).join(METHODOLOGY_FILE)
}

/// Extracted methodology documents live under `meta/generated/` until they
/// are promoted into the namespace proper.
pub fn generated_methodology_path(root: &Path, namespace: &str) -> PathBuf {
    root.join(GENERATED_DIR)
        .join(format!("{namespace}.{METHODOLOGY_FILE}"))
}

pub fn processes_dir(root: &Path, namespace: &str) -> PathBuf {
    namespace_dir(root, namespace).join(PROCESSES_DIR)
}

pub fn skills_dir(root: &Path, namespace: &str) -> PathBuf {
    namespace_dir(root, namespace).join(SKILLS_DIR)
}

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn legacy_manifest_path(root: &Path) -> PathBuf {
    root.join(LEGACY_MANIFEST_FILE)
}

pub fn installed_skills_dir(root: &Path) -> PathBuf {
    root.join(INSTALLED_SKILLS_DIR)
}

pub fn installed_processes_dir(root: &Path) -> PathBuf {
    root.join(PROCESSES_DIR)
}

// ---------------------------------------------------------------------------
// Namespace id validation
// ---------------------------------------------------------------------------

static NAMESPACE_RE: OnceLock<Regex> = OnceLock::new();

fn namespace_re() -> &'static Regex {
    NAMESPACE_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || namespace.len() > 64 || !namespace_re().is_match(namespace) {
        return Err(MethodError::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
