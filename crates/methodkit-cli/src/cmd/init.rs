use anyhow::{bail, Context};
use methodkit_core::manifest::{self, Manifest};
use methodkit_core::namespace;
use std::path::Path;

pub fn run(root: &Path, source: &Path, methodology: &str, bundle: &str) -> anyhow::Result<()> {
    if manifest::read_manifest(root)?.is_some() {
        bail!("already initialized: .installed.yaml exists");
    }

    if !namespace::namespace_exists(source, methodology) {
        let available = namespace::available_namespaces(source)?;
        bail!(
            "methodology '{methodology}' not found in {} (available: {})",
            source.display(),
            available.join(", ")
        );
    }

    let doc = namespace::load_methodology(source, methodology)
        .with_context(|| format!("failed to load methodology '{methodology}'"))?;

    let mut m = Manifest::new(methodology, bundle, &doc.version);
    m.methodology_path = Some(source.display().to_string());
    manifest::write_manifest(root, &m).context("failed to write .installed.yaml")?;

    println!("Initialized methodology tracking in: {}", root.display());
    println!("  methodology: {methodology} ({})", doc.version);
    println!("  bundle:      {bundle}");
    println!("  source:      {}", source.display());
    println!("\nNext: methodkit install {methodology}/skills --all");
    Ok(())
}
