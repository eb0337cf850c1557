pub mod check;
pub mod show;
pub mod synth;

use std::path::Path;

use anyhow::{Context, Result};

use sysdl_load::Model;

use crate::registry_file;

/// Load a catalogue against a registry file, printing the full diagnostic
/// report on failure.
pub fn load_model(catalogue: &Path, registry: &Path) -> Result<Model> {
    let registry = registry_file::load_registry(registry)?;
    let text = std::fs::read_to_string(catalogue)
        .with_context(|| format!("reading catalogue {}", catalogue.display()))?;
    match sysdl_load::load(&text, &registry) {
        Ok(model) => Ok(model),
        Err(report) => {
            for diagnostic in &report.diagnostics {
                eprintln!("{diagnostic}");
            }
            anyhow::bail!("catalogue has {} error(s)", report.error_count())
        }
    }
}
