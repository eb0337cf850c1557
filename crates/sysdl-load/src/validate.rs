//! Batched cross-reference validation.
//!
//! Runs after the table is fully populated and checks every operation in
//! one pass, collecting every defect. The checks repeat some guarantees
//! the builder already enforces by construction; tables assembled
//! programmatically get the same scrutiny as parsed ones.

use sysdl_core::{
    DeclTable, Domain, Operation, ResourceGraph, SizePolicy, TypeDescriptor, TypeRegistry,
};

use crate::report::Diagnostic;

/// Validate every operation in the table; returns the complete defect
/// list, errors and warnings alike. Never stops early.
pub fn validate(table: &DeclTable, registry: &TypeRegistry) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for op in table.iter() {
        check_param_names(op, &mut diagnostics);
        for param in &op.params {
            check_type(op, &param.name, &param.ty, registry, &mut diagnostics);
        }
        if let Some(ret) = &op.ret {
            check_type(op, "<return>", ret, registry, &mut diagnostics);
        }
        check_link_targets(op, &mut diagnostics);
    }

    // Consumers with no producer and no stand-in: non-fatal, handles may
    // arrive out of band.
    let graph = ResourceGraph::build(table);
    for kind in graph.orphaned_kinds(registry) {
        diagnostics.push(Diagnostic::warning(format!(
            "resource kind '{kind}' has consumers but no producer and no stand-in"
        )));
    }

    diagnostics
}

fn check_param_names(op: &Operation, diagnostics: &mut Vec<Diagnostic>) {
    for (i, param) in op.params.iter().enumerate() {
        if op.params[..i].iter().any(|p| p.name == param.name) {
            diagnostics.push(
                Diagnostic::error("parameter name declared twice")
                    .with_operation(op.key.clone())
                    .with_parameter(&param.name),
            );
        }
    }
}

fn err(op: &Operation, param: &str, message: String) -> Diagnostic {
    Diagnostic::error(message)
        .with_operation(op.key.clone())
        .with_parameter(param)
}

fn check_type(
    op: &Operation,
    param: &str,
    ty: &TypeDescriptor,
    registry: &TypeRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match ty {
        TypeDescriptor::Scalar(_) | TypeDescriptor::StringLit { .. } => {}
        TypeDescriptor::ConstantDomain { base, domain } => match domain {
            Domain::Set(values) => {
                if values.is_empty() {
                    diagnostics.push(err(op, param, "constant domain set is empty".to_string()));
                }
                for value in values {
                    if !base.fits(*value) {
                        diagnostics.push(err(
                            op,
                            param,
                            format!("domain value {value} does not fit {base}"),
                        ));
                    }
                }
            }
            Domain::Range { lo, hi } => {
                if hi < lo {
                    diagnostics.push(err(op, param, format!("domain range ({lo},{hi}) is empty")));
                } else {
                    for bound in [lo, hi] {
                        if !base.fits(*bound) {
                            diagnostics.push(err(
                                op,
                                param,
                                format!("range bound {bound} does not fit {base}"),
                            ));
                        }
                    }
                }
            }
        },
        TypeDescriptor::Pointer { pointee, .. } => {
            check_type(op, param, pointee, registry, diagnostics);
        }
        TypeDescriptor::Buffer { element, size } => {
            match size {
                SizePolicy::Fixed(0) => {
                    diagnostics.push(err(op, param, "fixed buffer size must be positive".into()));
                }
                SizePolicy::Fixed(_) => {}
                SizePolicy::Range { min, max } => {
                    if max < min {
                        diagnostics.push(err(
                            op,
                            param,
                            format!("buffer size range ({min},{max}) is empty"),
                        ));
                    }
                }
                SizePolicy::LinkedToLength {
                    param: target,
                    width,
                } => match op.param(target) {
                    None => diagnostics.push(err(
                        op,
                        param,
                        format!("length-link names nonexistent parameter '{target}'"),
                    )),
                    Some(linked) => {
                        if target == param {
                            diagnostics.push(err(
                                op,
                                param,
                                "length-link references its own buffer".into(),
                            ));
                        }
                        match linked.ty.as_scalar() {
                            None => diagnostics.push(err(
                                op,
                                param,
                                format!(
                                    "length-link parameter '{target}' is not an integer scalar"
                                ),
                            )),
                            Some(scalar) if scalar != *width => diagnostics.push(err(
                                op,
                                param,
                                format!(
                                    "length-link parameter '{target}' is {scalar}, link declares {width}"
                                ),
                            )),
                            Some(_) => {}
                        }
                    }
                },
            }
            check_type(op, param, element, registry, diagnostics);
        }
        TypeDescriptor::ResourceHandle { kind } => {
            if registry.resource(kind).is_none() {
                diagnostics.push(err(op, param, format!("unknown resource kind '{kind}'")));
            }
        }
        TypeDescriptor::OpaqueStruct { name, size } => {
            if *size == 0 {
                diagnostics.push(err(op, param, format!("struct '{name}' has zero size")));
            }
        }
    }
}

/// A length parameter referenced by two buffers cannot equal both lengths.
fn check_link_targets(op: &Operation, diagnostics: &mut Vec<Diagnostic>) {
    let mut targets: Vec<&str> = Vec::new();
    for param in &op.params {
        if let Some((_, SizePolicy::LinkedToLength { param: target, .. })) = param.ty.buffer_view()
        {
            if targets.contains(&target.as_str()) {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "length parameter '{target}' is linked from more than one buffer"
                    ))
                    .with_operation(op.key.clone())
                    .with_parameter(&param.name),
                );
            }
            targets.push(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysdl_core::{Operation, OperationKey, Param, ScalarType};

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_resource("fd_t", Some(0));
        reg
    }

    fn single(op: Operation) -> DeclTable {
        let mut table = DeclTable::new();
        table.insert(op).unwrap();
        table
    }

    fn op(params: Vec<Param>) -> Operation {
        Operation {
            key: OperationKey::plain("probe"),
            ident: None,
            params,
            ret: None,
            annotations: Vec::new(),
            group: "G".into(),
        }
    }

    #[test]
    fn dangling_length_link_is_an_error_not_ignored() {
        let table = single(op(vec![Param::new(
            "buf",
            TypeDescriptor::Buffer {
                element: Box::new(TypeDescriptor::Scalar(ScalarType::U8)),
                size: SizePolicy::LinkedToLength {
                    param: "count".into(),
                    width: ScalarType::I32,
                },
            },
        )]));
        let diags = validate(&table, &registry());
        assert!(diags
            .iter()
            .any(|d| d.message.contains("nonexistent parameter 'count'")));
    }

    #[test]
    fn empty_domains_rejected() {
        let table = single(op(vec![
            Param::new(
                "a",
                TypeDescriptor::ConstantDomain {
                    base: ScalarType::I32,
                    domain: Domain::Set(vec![]),
                },
            ),
            Param::new(
                "b",
                TypeDescriptor::ConstantDomain {
                    base: ScalarType::I32,
                    domain: Domain::Range { lo: 5, hi: 1 },
                },
            ),
        ]));
        let diags = validate(&table, &registry());
        assert_eq!(diags.len(), 2);
        assert!(diags[0].message.contains("empty"));
        assert!(diags[1].message.contains("(5,1)"));
    }

    #[test]
    fn out_of_width_domain_values_rejected() {
        let table = single(op(vec![Param::new(
            "flags",
            TypeDescriptor::ConstantDomain {
                base: ScalarType::U8,
                domain: Domain::Set(vec![0, 300]),
            },
        )]));
        let diags = validate(&table, &registry());
        assert!(diags.iter().any(|d| d.message.contains("300")));
    }

    #[test]
    fn zero_fixed_buffer_rejected() {
        let table = single(op(vec![Param::new(
            "buf",
            TypeDescriptor::Buffer {
                element: Box::new(TypeDescriptor::Scalar(ScalarType::U8)),
                size: SizePolicy::Fixed(0),
            },
        )]));
        let diags = validate(&table, &registry());
        assert!(diags.iter().any(|d| d.message.contains("positive")));
    }

    #[test]
    fn unknown_resource_kind_rejected() {
        let table = single(op(vec![Param::new(
            "h",
            TypeDescriptor::ResourceHandle {
                kind: "ghost_t".into(),
            },
        )]));
        let diags = validate(&table, &registry());
        assert!(diags.iter().any(|d| d.message.contains("'ghost_t'")));
    }

    #[test]
    fn orphaned_kind_is_a_warning_only() {
        let mut reg = registry();
        reg.register_resource("orphan_t", None);
        let table = single(op(vec![Param::new(
            "h",
            TypeDescriptor::ResourceHandle {
                kind: "orphan_t".into(),
            },
        )]));
        let diags = validate(&table, &reg);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, crate::report::Severity::Warning);
        assert!(diags[0].message.contains("'orphan_t'"));
    }

    #[test]
    fn duplicate_parameter_names_rejected() {
        let table = single(op(vec![
            Param::new("x", TypeDescriptor::Scalar(ScalarType::I32)),
            Param::new("x", TypeDescriptor::Scalar(ScalarType::I64)),
        ]));
        let diags = validate(&table, &registry());
        assert!(diags.iter().any(|d| d.message.contains("declared twice")));
    }

    #[test]
    fn width_mismatch_between_link_and_param() {
        let table = single(op(vec![
            Param::new("count", TypeDescriptor::Scalar(ScalarType::I64)),
            Param::new(
                "buf",
                TypeDescriptor::Buffer {
                    element: Box::new(TypeDescriptor::Scalar(ScalarType::U8)),
                    size: SizePolicy::LinkedToLength {
                        param: "count".into(),
                        width: ScalarType::I32,
                    },
                },
            ),
        ]));
        let diags = validate(&table, &registry());
        assert!(diags.iter().any(|d| d.message.contains("link declares i32")));
    }
}
