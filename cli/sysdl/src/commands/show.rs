//! `sysdl show` — list operations, parameter roles, and resource kinds.

use std::path::Path;

use anyhow::Result;

use crate::commands::load_model;

pub fn run(catalogue: &Path, registry: &Path) -> Result<()> {
    let model = load_model(catalogue, registry)?;

    let mut current_group = None;
    for op in model.table().iter() {
        if current_group != Some(&op.group) {
            println!("group {}", op.group);
            current_group = Some(&op.group);
        }
        let ident = op
            .ident
            .map(|n| format!(" #{n}"))
            .unwrap_or_default();
        println!("  fn {}{ident}", op.key);
        for (idx, param) in op.params.iter().enumerate() {
            let role = op
                .role_of(idx)
                .expect("index comes from the parameter list");
            println!("    {:<12} {:<10} {}", param.name, role.to_string(), param.ty);
        }
        if let Some(ret) = &op.ret {
            println!("    {:<12} {:<10} {}", "<return>", "produces", ret);
        }
    }

    let kinds: Vec<&str> = model.graph().kinds().collect();
    if !kinds.is_empty() {
        println!("\nresource kinds");
        for kind in kinds {
            let producers = model.graph().producers_of(kind);
            let consumers = model.graph().consumers_of(kind);
            let stand_in = model
                .registry()
                .stand_in(kind)
                .map(|v| format!(", stand-in {v}"))
                .unwrap_or_default();
            let orphan = if producers.is_empty()
                && !consumers.is_empty()
                && model.registry().stand_in(kind).is_none()
            {
                "  [no producer]"
            } else {
                ""
            };
            println!(
                "  {kind}: {} producer(s), {} consumer(s){stand_in}{orphan}",
                producers.len(),
                consumers.len()
            );
        }
    }

    Ok(())
}
