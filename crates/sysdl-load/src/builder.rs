//! Type descriptor building.
//!
//! Converts raw type expressions into canonical [`TypeDescriptor`]s,
//! resolving named base types against the registry, and lowers `len<w, p>`
//! length-links onto the referenced buffer's size policy. Building fails
//! per declaration; the loader keeps going so one bad declaration never
//! hides the rest.

use tracing::debug;

use sysdl_core::{
    Direction, Operation, OperationKey, Param, ScalarType, SizePolicy, StringKind, TypeDescriptor,
    TypeRegistry,
};
use sysdl_parser::{RawArraySize, RawDecl, RawDirection, RawDomain, RawType};

use crate::report::Diagnostic;

/// Element-count range a sourceless `[T]` array lowers to. The size-policy
/// union is closed, so unbounded arrays get bounded defaults.
pub const UNBOUNDED_RANGE: (u64, u64) = (0, 256);

/// Errors raised while building one type expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A name resolved against neither the scalar set, the string types,
    /// nor the registry.
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    /// A length-link's declared width is not an integer scalar.
    #[error("length-link width '{width}' is not an integer scalar")]
    BadLenWidth { width: String },

    /// A length-link appeared nested inside another type expression.
    #[error("length-link must be a parameter's top-level type")]
    MisplacedLenLink,

    /// A brace-suffix domain on an incompatible base type.
    #[error("type '{name}' cannot carry {domain} domain")]
    BadDomain { name: String, domain: &'static str },
}

/// Build one operation from a raw declaration.
///
/// Collects every defect in the declaration rather than stopping at the
/// first; on any defect the whole declaration is rejected.
pub fn build_operation(
    group: &str,
    decl: &RawDecl,
    registry: &TypeRegistry,
) -> Result<Operation, Vec<Diagnostic>> {
    let key = OperationKey {
        name: decl.name.clone(),
        variant: decl.variant.clone(),
    };
    let mut diagnostics = Vec::new();
    let mut params = Vec::new();
    // (length param, width, link target) triples awaiting lowering.
    let mut links: Vec<(String, ScalarType, String)> = Vec::new();

    for raw in &decl.params {
        match &raw.ty {
            RawType::LenLink { width, param } => match ScalarType::from_name(width) {
                Some(w) => {
                    params.push(Param::new(&raw.name, TypeDescriptor::Scalar(w)));
                    links.push((raw.name.clone(), w, param.clone()));
                }
                None => diagnostics.push(
                    Diagnostic::error(
                        BuildError::BadLenWidth {
                            width: width.clone(),
                        }
                        .to_string(),
                    )
                    .with_operation(key.clone())
                    .with_parameter(&raw.name),
                ),
            },
            other => match build_type(other, registry) {
                Ok(ty) => params.push(Param::new(&raw.name, ty)),
                Err(err) => diagnostics.push(
                    Diagnostic::error(err.to_string())
                        .with_operation(key.clone())
                        .with_parameter(&raw.name),
                ),
            },
        }
    }

    for (len_name, width, target) in links {
        match lower_link(&mut params, &len_name, width, &target) {
            Ok(()) => {}
            Err(message) => diagnostics.push(
                Diagnostic::error(message)
                    .with_operation(key.clone())
                    .with_parameter(len_name),
            ),
        }
    }

    let ret = match &decl.ret {
        Some(raw) => match build_type(raw, registry) {
            Ok(ty) => Some(ty),
            Err(err) => {
                diagnostics.push(
                    Diagnostic::error(format!("return type: {err}")).with_operation(key.clone()),
                );
                None
            }
        },
        None => None,
    };

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    debug!(op = %key, params = params.len(), "built operation");
    Ok(Operation {
        key,
        ident: decl.ident,
        params,
        ret,
        annotations: decl.annotations.clone(),
        group: group.to_string(),
    })
}

/// Rewrite the target buffer's size policy to point at the length param.
fn lower_link(
    params: &mut [Param],
    len_name: &str,
    width: ScalarType,
    target: &str,
) -> Result<(), String> {
    if target == len_name {
        return Err("length-link cannot reference itself".to_string());
    }
    let Some(param) = params.iter_mut().find(|p| p.name == target) else {
        return Err(format!("length-link target '{target}' does not exist"));
    };
    let slot = match &mut param.ty {
        TypeDescriptor::Buffer { size, .. } => size,
        TypeDescriptor::Pointer { pointee, .. } => match pointee.as_mut() {
            TypeDescriptor::Buffer { size, .. } => size,
            _ => return Err(format!("length-link target '{target}' is not a buffer")),
        },
        _ => return Err(format!("length-link target '{target}' is not a buffer")),
    };
    if matches!(slot, SizePolicy::LinkedToLength { .. }) {
        return Err(format!("buffer '{target}' is already length-linked"));
    }
    *slot = SizePolicy::LinkedToLength {
        param: len_name.to_string(),
        width,
    };
    Ok(())
}

/// Build one type expression.
pub fn build_type(raw: &RawType, registry: &TypeRegistry) -> Result<TypeDescriptor, BuildError> {
    match raw {
        RawType::Name(name) => build_name(name, registry),
        RawType::WithDomain { name, domain } => build_domain(name, domain, registry),
        RawType::Pointer { direction, inner } => Ok(TypeDescriptor::Pointer {
            direction: match direction {
                Some(RawDirection::In) => Direction::In,
                Some(RawDirection::Out) => Direction::Out,
                Some(RawDirection::InOut) | None => Direction::InOut,
            },
            pointee: Box::new(build_type(inner, registry)?),
        }),
        RawType::Array { element, size } => Ok(TypeDescriptor::Buffer {
            element: Box::new(build_type(element, registry)?),
            size: match size {
                RawArraySize::Fixed(n) => SizePolicy::Fixed(*n),
                RawArraySize::Range { min, max } => SizePolicy::Range {
                    min: *min,
                    max: *max,
                },
                RawArraySize::Unbounded => SizePolicy::Range {
                    min: UNBOUNDED_RANGE.0,
                    max: UNBOUNDED_RANGE.1,
                },
            },
        }),
        RawType::LenLink { .. } => Err(BuildError::MisplacedLenLink),
    }
}

fn build_name(name: &str, registry: &TypeRegistry) -> Result<TypeDescriptor, BuildError> {
    if let Some(scalar) = ScalarType::from_name(name) {
        return Ok(TypeDescriptor::Scalar(scalar));
    }
    if let Some(kind) = string_kind(name) {
        return Ok(TypeDescriptor::StringLit {
            kind,
            alternatives: Vec::new(),
        });
    }
    if let Some(res) = registry.resource(name) {
        return Ok(TypeDescriptor::ResourceHandle {
            kind: res.name.clone(),
        });
    }
    if let Some(def) = registry.struct_def(name) {
        return Ok(TypeDescriptor::OpaqueStruct {
            name: def.name.clone(),
            size: def.size,
        });
    }
    Err(BuildError::UnknownType {
        name: name.to_string(),
    })
}

fn build_domain(
    name: &str,
    domain: &RawDomain,
    registry: &TypeRegistry,
) -> Result<TypeDescriptor, BuildError> {
    if let Some(base) = ScalarType::from_name(name) {
        return match domain {
            RawDomain::IntSet(values) => Ok(TypeDescriptor::ConstantDomain {
                base,
                domain: sysdl_core::Domain::Set(values.clone()),
            }),
            RawDomain::IntRange { lo, hi } => Ok(TypeDescriptor::ConstantDomain {
                base,
                domain: sysdl_core::Domain::Range { lo: *lo, hi: *hi },
            }),
            RawDomain::StrSet(_) => Err(BuildError::BadDomain {
                name: name.to_string(),
                domain: "a string",
            }),
        };
    }
    if let Some(kind) = string_kind(name) {
        return match domain {
            RawDomain::StrSet(values) => Ok(TypeDescriptor::StringLit {
                kind,
                alternatives: values.clone(),
            }),
            _ => Err(BuildError::BadDomain {
                name: name.to_string(),
                domain: "an integer",
            }),
        };
    }
    // Registry names never take domains; report unknown names as such.
    if registry.contains(name) {
        Err(BuildError::BadDomain {
            name: name.to_string(),
            domain: "any",
        })
    } else {
        Err(BuildError::UnknownType {
            name: name.to_string(),
        })
    }
}

fn string_kind(name: &str) -> Option<StringKind> {
    match name {
        "cstr" => Some(StringKind::Str),
        "filename" => Some(StringKind::Path),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysdl_core::Domain;
    use sysdl_parser::parse;

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_resource("fd_t", Some(0));
        reg.register_struct("stat", 144);
        reg
    }

    fn build_first(src: &str) -> Result<Operation, Vec<Diagnostic>> {
        let outcome = parse(src);
        assert!(outcome.errors.is_empty(), "parse: {:?}", outcome.errors);
        let (group, decl) = outcome.decls().next().expect("one declaration");
        build_operation(&group.name, decl, &registry())
    }

    #[test]
    fn write_lowers_length_link_onto_buffer() {
        let op = build_first("group G { fn write(fd fd_t, buf *[i8], count len<i32, buf>) }")
            .expect("builds");
        let buf = op.param("buf").unwrap();
        let (_, size) = buf.ty.buffer_view().unwrap();
        assert_eq!(
            *size,
            SizePolicy::LinkedToLength {
                param: "count".into(),
                width: ScalarType::I32,
            }
        );
        assert_eq!(
            op.param("count").unwrap().ty,
            TypeDescriptor::Scalar(ScalarType::I32)
        );
    }

    #[test]
    fn names_resolve_by_category() {
        let op = build_first("group G { fn f(a i32, b fd_t, c *Out stat, d *In cstr) }")
            .expect("builds");
        assert_eq!(op.param("a").unwrap().ty, TypeDescriptor::Scalar(ScalarType::I32));
        assert_eq!(
            op.param("b").unwrap().ty,
            TypeDescriptor::ResourceHandle { kind: "fd_t".into() }
        );
        match &op.param("c").unwrap().ty {
            TypeDescriptor::Pointer { direction, pointee } => {
                assert_eq!(*direction, Direction::Out);
                assert_eq!(
                    **pointee,
                    TypeDescriptor::OpaqueStruct {
                        name: "stat".into(),
                        size: 144,
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let diags = build_first("group G { fn f(x mystery_t) }").unwrap_err();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unknown type 'mystery_t'"));
        assert_eq!(diags[0].parameter.as_deref(), Some("x"));
    }

    #[test]
    fn bad_len_width_rejected() {
        let diags =
            build_first("group G { fn f(buf *[i8], n len<cstr, buf>) }").unwrap_err();
        assert!(diags[0].message.contains("not an integer scalar"));
    }

    #[test]
    fn dangling_link_target_rejected() {
        let diags = build_first("group G { fn f(n len<i32, nope>) }").unwrap_err();
        assert!(diags[0].message.contains("'nope' does not exist"));
    }

    #[test]
    fn link_to_non_buffer_rejected() {
        let diags = build_first("group G { fn f(x i32, n len<i32, x>) }").unwrap_err();
        assert!(diags[0].message.contains("not a buffer"));
    }

    #[test]
    fn all_defects_collected_in_one_pass() {
        let diags =
            build_first("group G { fn f(x mystery_t, y other_t, n len<i32, gone>) }").unwrap_err();
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn unbounded_array_gets_default_range() {
        let op = build_first("group G { fn f(buf *[u8]) }").expect("builds");
        let (_, size) = op.param("buf").unwrap().ty.buffer_view().unwrap();
        assert_eq!(
            *size,
            SizePolicy::Range {
                min: UNBOUNDED_RANGE.0,
                max: UNBOUNDED_RANGE.1,
            }
        );
    }

    #[test]
    fn domains_attach_to_scalars_and_strings_only() {
        let op = build_first(
            r#"group G { fn f(cmd i32{0xae41}, file *In filename{"/dev/kvm"}) }"#,
        )
        .expect("builds");
        assert_eq!(
            op.param("cmd").unwrap().ty,
            TypeDescriptor::ConstantDomain {
                base: ScalarType::I32,
                domain: Domain::Set(vec![0xae41]),
            }
        );

        let diags = build_first(r#"group G { fn f(x i32{"oops"}) }"#).unwrap_err();
        assert!(diags[0].message.contains("cannot carry"));
    }
}
