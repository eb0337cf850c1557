//! Catalogue loading: parse, build, insert, validate.
//!
//! [`load`] is the one-shot, process-wide initialization boundary: it takes
//! catalogue text and the type registry and produces an immutable [`Model`]
//! or a [`LoadReport`] carrying the complete defect list. Parsing and
//! descriptor building fail per declaration but loading continues across
//! declarations, and validation never stops early, so one load reports
//! everything that is wrong at once.
//!
//! ```
//! use sysdl_core::TypeRegistry;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_resource("fd_t", Some(0));
//!
//! let model = sysdl_load::load(
//!     "group Files { fn write(fd fd_t, buf *[i8], count len<i32, buf>) }",
//!     &registry,
//! )
//! .expect("catalogue loads");
//! assert_eq!(model.table().len(), 1);
//! ```

pub mod builder;
pub mod report;
pub mod validate;

use tracing::{debug, warn};

use sysdl_core::{DeclTable, ResourceGraph, TypeRegistry};

pub use builder::{build_operation, build_type, BuildError, UNBOUNDED_RANGE};
pub use report::{Diagnostic, LoadReport, Severity};
pub use validate::validate;

/// The validated, immutable description model.
///
/// Built once by [`load`] and read-only afterwards: plain owned data,
/// `Send + Sync`, safe to share across unbounded concurrent synthesis
/// sessions without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    table: DeclTable,
    graph: ResourceGraph,
    registry: TypeRegistry,
    warnings: Vec<Diagnostic>,
}

impl Model {
    /// The declaration table.
    pub fn table(&self) -> &DeclTable {
        &self.table
    }

    /// The resource dependency graph.
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// The registry the model was resolved against.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Non-fatal diagnostics retained from the load.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

/// Load catalogue text against a registry.
///
/// Returns the model when no error-severity diagnostic was produced; the
/// report otherwise. Either way, every defect found is reported.
pub fn load(text: &str, registry: &TypeRegistry) -> Result<Model, LoadReport> {
    let mut report = LoadReport::default();

    let outcome = sysdl_parser::parse(text);
    debug!(
        groups = outcome.groups.len(),
        errors = outcome.errors.len(),
        "parsed catalogue"
    );
    for syntax_error in &outcome.errors {
        report.push(Diagnostic::error(syntax_error.to_string()));
    }

    let mut table = DeclTable::new();
    for (group, decl) in outcome.decls() {
        match build_operation(&group.name, decl, registry) {
            Ok(op) => {
                let key = op.key.clone();
                if let Err(e) = table.insert(op) {
                    report.push(Diagnostic::error(e.to_string()).with_operation(key));
                }
            }
            Err(diagnostics) => report.extend(diagnostics),
        }
    }

    report.extend(validate(&table, registry));

    for diagnostic in &report.diagnostics {
        if diagnostic.severity == Severity::Warning {
            warn!(%diagnostic, "load diagnostic");
        }
    }

    if report.has_errors() {
        return Err(report);
    }

    let graph = ResourceGraph::build(&table);
    debug!(operations = table.len(), "catalogue loaded");
    Ok(Model {
        table,
        graph,
        registry: registry.clone(),
        warnings: report.warnings(),
    })
}
