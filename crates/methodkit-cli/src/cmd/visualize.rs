use anyhow::{bail, Context};
use methodkit_core::diagram::{self, DiagramKind};
use methodkit_core::{io, namespace};
use std::path::Path;

pub fn run(
    root: &Path,
    ns: &str,
    format: &str,
    diagram_type: &str,
    output: Option<&Path>,
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

    let kind = match diagram_type {
        "state" => DiagramKind::State,
        "actors" => DiagramKind::Actors,
        "artifacts" => DiagramKind::Artifacts,
        other => bail!("unknown diagram type '{other}': expected state, actors, or artifacts"),
    };

    let rendered = match format {
        "mermaid" => diagram::mermaid(&methodology, kind),
        "plantuml" => diagram::plantuml(&methodology, kind),
        other => bail!("unknown format '{other}': expected mermaid or plantuml"),
    };

    match output {
        Some(path) => {
            io::atomic_write(path, rendered.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {diagram_type} diagram to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
