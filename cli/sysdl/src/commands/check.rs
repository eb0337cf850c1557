//! `sysdl check` — load a catalogue and report every defect.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::registry_file;

pub fn run(catalogue: &Path, registry: &Path, json: bool) -> Result<()> {
    let registry = registry_file::load_registry(registry)?;
    let text = std::fs::read_to_string(catalogue)
        .with_context(|| format!("reading catalogue {}", catalogue.display()))?;

    match sysdl_load::load(&text, &registry) {
        Ok(model) => {
            if json {
                let summary = serde_json::json!({
                    "ok": true,
                    "operations": model.table().len(),
                    "warnings": model.warnings(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for warning in model.warnings() {
                    eprintln!("{warning}");
                }
                println!(
                    "ok: {} operation(s), {} warning(s)",
                    model.table().len(),
                    model.warnings().len()
                );
            }
            Ok(())
        }
        Err(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for diagnostic in &report.diagnostics {
                    eprintln!("{diagnostic}");
                }
            }
            bail!("catalogue has {} error(s)", report.error_count())
        }
    }
}
