//! Recursive-descent parser for catalogue text.
//!
//! The parser is resilient per declaration: a syntax error inside one `fn`
//! is recorded and the stream synchronizes to the next declaration
//! boundary, so a single malformed declaration never hides the rest of the
//! catalogue. Group headers and unterminated groups fail the whole group.

use logos::Logos;

use crate::ast::{
    RawAnnotation, RawArraySize, RawDecl, RawDirection, RawDomain, RawGroup, RawParam, RawType,
    Span,
};
use crate::error::SyntaxError;
use crate::stream::TokenStream;
use crate::token::Token;

/// Everything one parse pass produced: the groups that parsed, and every
/// syntax error encountered along the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutcome {
    pub groups: Vec<RawGroup>,
    pub errors: Vec<SyntaxError>,
}

impl ParseOutcome {
    /// All declarations across all groups, in source order.
    pub fn decls(&self) -> impl Iterator<Item = (&RawGroup, &RawDecl)> {
        self.groups
            .iter()
            .flat_map(|g| g.decls.iter().map(move |d| (g, d)))
    }
}

/// Parse catalogue text into raw declarations.
pub fn parse(source: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(tok) => tokens.push((tok, span)),
            Err(()) => outcome.errors.push(SyntaxError::at(
                source,
                span.start,
                format!("unrecognized token {:?}", &source[span.clone()]),
            )),
        }
    }

    let mut stream = TokenStream::new(source, tokens);
    while !stream.at_end() {
        if stream.check(&Token::Group) {
            match parse_group(&mut stream, &mut outcome.errors) {
                Ok(group) => outcome.groups.push(group),
                Err(err) => {
                    outcome.errors.push(err);
                    skip_to_group(&mut stream);
                }
            }
        } else {
            let found = stream.peek().cloned();
            outcome.errors.push(stream.error_here(match found {
                Some(tok) => format!("expected 'group', found {tok}"),
                None => "expected 'group'".to_string(),
            }));
            stream.advance();
            skip_to_group(&mut stream);
        }
    }

    outcome
}

fn skip_to_group(stream: &mut TokenStream<'_>) {
    while !stream.at_end() && !stream.check(&Token::Group) {
        stream.advance();
    }
}

fn parse_group(
    stream: &mut TokenStream<'_>,
    errors: &mut Vec<SyntaxError>,
) -> Result<RawGroup, SyntaxError> {
    let start = stream.offset();
    stream.expect(Token::Group)?;
    let name = stream.expect_ident("group name")?;
    stream.expect(Token::LBrace)?;

    let mut decls = Vec::new();
    loop {
        if stream.eat(&Token::RBrace) {
            break;
        }
        if stream.at_end() {
            return Err(stream.error_here(format!("unterminated group '{name}'")));
        }
        if stream.check(&Token::Fn) || stream.check(&Token::AttrStart) {
            let before = stream.offset();
            match parse_decl(stream) {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    errors.push(err);
                    stream.synchronize();
                    if stream.offset() == before {
                        stream.advance();
                    }
                }
            }
        } else {
            let found = stream.peek().cloned();
            errors.push(stream.error_here(match found {
                Some(tok) => format!("expected declaration, found {tok}"),
                None => "expected declaration".to_string(),
            }));
            stream.advance();
            stream.synchronize();
        }
    }

    Ok(RawGroup {
        name,
        decls,
        span: Span::new(start, stream.prev_end()),
    })
}

fn parse_decl(stream: &mut TokenStream<'_>) -> Result<RawDecl, SyntaxError> {
    let start = stream.offset();
    let mut annotations = Vec::new();
    let mut ident = None;

    while stream.check(&Token::AttrStart) {
        match parse_annotation(stream)? {
            RawAnnotation::Id(n) => ident = Some(n),
            RawAnnotation::Opaque(payload) => annotations.push(payload),
        }
    }

    stream.expect(Token::Fn)?;
    let name = stream.expect_ident("operation name")?;
    let variant = if stream.eat(&Token::At) {
        Some(stream.expect_ident("variant tag")?)
    } else {
        None
    };

    stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    if !stream.check(&Token::RParen) {
        loop {
            params.push(parse_param(stream)?);
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
    }
    stream.expect(Token::RParen)?;

    let ret = if starts_type(stream) {
        Some(parse_type(stream)?)
    } else {
        None
    };

    Ok(RawDecl {
        name,
        variant,
        ident,
        params,
        ret,
        annotations,
        span: Span::new(start, stream.prev_end()),
    })
}

/// Parse one `#[...]` annotation. `#[id(N)]` is the only interpreted form;
/// everything else is preserved verbatim as opaque payload text.
fn parse_annotation(stream: &mut TokenStream<'_>) -> Result<RawAnnotation, SyntaxError> {
    stream.expect(Token::AttrStart)?;
    let payload_start = stream.offset();

    let mut body = Vec::new();
    let mut depth = 0usize;
    let payload_end;
    loop {
        match stream.peek() {
            None => return Err(stream.error_here("unterminated annotation")),
            Some(Token::LBracket) => {
                depth += 1;
                body.push(stream.advance().expect("peeked token"));
            }
            Some(Token::RBracket) if depth == 0 => {
                payload_end = stream.offset();
                stream.advance();
                break;
            }
            Some(Token::RBracket) => {
                depth -= 1;
                body.push(stream.advance().expect("peeked token"));
            }
            Some(_) => body.push(stream.advance().expect("peeked token")),
        }
    }

    if let [Token::Ident(name), Token::LParen, Token::Integer(n), Token::RParen] = body.as_slice() {
        if name == "id" && *n >= 0 {
            return Ok(RawAnnotation::Id(*n as u64));
        }
    }
    Ok(RawAnnotation::Opaque(
        stream.slice(payload_start, payload_end).trim().to_string(),
    ))
}

fn parse_param(stream: &mut TokenStream<'_>) -> Result<RawParam, SyntaxError> {
    let start = stream.offset();
    // `len` is a type keyword but a common parameter name; allow it here.
    let name = if stream.eat(&Token::Len) {
        "len".to_string()
    } else {
        stream.expect_ident("parameter name")?
    };
    let ty = parse_type(stream)?;
    Ok(RawParam {
        name,
        ty,
        span: Span::new(start, stream.prev_end()),
    })
}

fn starts_type(stream: &TokenStream<'_>) -> bool {
    matches!(
        stream.peek(),
        Some(Token::Ident(_)) | Some(Token::Star) | Some(Token::LBracket) | Some(Token::Len)
    )
}

fn parse_type(stream: &mut TokenStream<'_>) -> Result<RawType, SyntaxError> {
    match stream.peek() {
        Some(Token::Star) => {
            stream.advance();
            let direction = if stream.eat(&Token::DirIn) {
                Some(RawDirection::In)
            } else if stream.eat(&Token::DirOut) {
                Some(RawDirection::Out)
            } else if stream.eat(&Token::DirInOut) {
                Some(RawDirection::InOut)
            } else {
                None
            };
            let inner = parse_type(stream)?;
            Ok(RawType::Pointer {
                direction,
                inner: Box::new(inner),
            })
        }
        Some(Token::LBracket) => {
            stream.advance();
            let element = parse_type(stream)?;
            let size = if stream.eat(&Token::Semicolon) {
                if stream.eat(&Token::LParen) {
                    let min = parse_count(stream, "minimum element count")?;
                    stream.expect(Token::Comma)?;
                    let max = parse_count(stream, "maximum element count")?;
                    stream.expect(Token::RParen)?;
                    RawArraySize::Range { min, max }
                } else {
                    RawArraySize::Fixed(parse_count(stream, "element count")?)
                }
            } else {
                RawArraySize::Unbounded
            };
            stream.expect(Token::RBracket)?;
            Ok(RawType::Array {
                element: Box::new(element),
                size,
            })
        }
        Some(Token::Len) => {
            stream.advance();
            stream.expect(Token::Lt)?;
            let width = stream.expect_ident("length width type")?;
            stream.expect(Token::Comma)?;
            let param = stream.expect_ident("linked parameter name")?;
            stream.expect(Token::Gt)?;
            Ok(RawType::LenLink { width, param })
        }
        Some(Token::Ident(_)) => {
            let name = stream.expect_ident("type name")?;
            if stream.eat(&Token::LBrace) {
                let domain = parse_domain(stream)?;
                stream.expect(Token::RBrace)?;
                Ok(RawType::WithDomain { name, domain })
            } else {
                Ok(RawType::Name(name))
            }
        }
        Some(found) => {
            let found = found.clone();
            Err(stream.error_here(format!("expected type expression, found {found}")))
        }
        None => Err(stream.error_here("expected type expression, found end of input")),
    }
}

fn parse_count(stream: &mut TokenStream<'_>, what: &str) -> Result<u64, SyntaxError> {
    let value = stream.expect_integer(what)?;
    u64::try_from(value).map_err(|_| stream.error_here(format!("{what} cannot be negative")))
}

fn parse_domain(stream: &mut TokenStream<'_>) -> Result<RawDomain, SyntaxError> {
    match stream.peek() {
        // `{(lo, hi)}` — inclusive range
        Some(Token::LParen) => {
            stream.advance();
            let lo = stream.expect_integer("range lower bound")?;
            stream.expect(Token::Comma)?;
            let hi = stream.expect_integer("range upper bound")?;
            stream.expect(Token::RParen)?;
            Ok(RawDomain::IntRange { lo, hi })
        }
        // `{"s1", "s2"}` — literal alternatives
        Some(Token::String(_)) => {
            let mut values = Vec::new();
            loop {
                match stream.advance() {
                    Some(Token::String(s)) => values.push(s),
                    _ => return Err(stream.error_here("expected string literal")),
                }
                if !stream.eat(&Token::Comma) {
                    break;
                }
                if !stream.check(&Token::String("".into())) {
                    return Err(stream.error_here("expected string literal after ','"));
                }
            }
            Ok(RawDomain::StrSet(values))
        }
        // `{v1, v2, ...}` — finite integer set
        Some(Token::Integer(_)) | Some(Token::Minus) => {
            let mut values = Vec::new();
            loop {
                values.push(stream.expect_integer("domain value")?);
                if !stream.eat(&Token::Comma) {
                    break;
                }
            }
            Ok(RawDomain::IntSet(values))
        }
        Some(found) => {
            let found = found.clone();
            Err(stream.error_here(format!("expected domain values, found {found}")))
        }
        None => Err(stream.error_here("expected domain values, found end of input")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> ParseOutcome {
        let outcome = parse(src);
        assert!(outcome.errors.is_empty(), "errors: {:?}", outcome.errors);
        outcome
    }

    #[test]
    fn write_declaration() {
        let outcome = parse_ok("group Files { fn write(fd fd_t, buf *[i8], count len<i32, buf>) }");
        assert_eq!(outcome.groups.len(), 1);
        let decl = &outcome.groups[0].decls[0];
        assert_eq!(decl.name, "write");
        assert_eq!(decl.params.len(), 3);
        assert_eq!(decl.params[0].ty, RawType::Name("fd_t".into()));
        assert_eq!(
            decl.params[1].ty,
            RawType::Pointer {
                direction: None,
                inner: Box::new(RawType::Array {
                    element: Box::new(RawType::Name("i8".into())),
                    size: RawArraySize::Unbounded,
                }),
            }
        );
        assert_eq!(
            decl.params[2].ty,
            RawType::LenLink {
                width: "i32".into(),
                param: "buf".into(),
            }
        );
        assert!(decl.ret.is_none());
    }

    #[test]
    fn ioctl_variant_with_domains_and_return() {
        let src = r"group Kvm {
            fn ioctl@KVM_CREATE_VCPU(fd kvmvmfd_t, cmd i32{0xae41}, arg i32{0,1,2,3}) vcpu_t
        }";
        let outcome = parse_ok(src);
        let decl = &outcome.groups[0].decls[0];
        assert_eq!(decl.variant.as_deref(), Some("KVM_CREATE_VCPU"));
        assert_eq!(
            decl.params[1].ty,
            RawType::WithDomain {
                name: "i32".into(),
                domain: RawDomain::IntSet(vec![0xae41]),
            }
        );
        assert_eq!(decl.ret, Some(RawType::Name("vcpu_t".into())));
    }

    #[test]
    fn directions_fixed_and_range_arrays() {
        let src = r"group G {
            fn stat(file *In cstr, statbuf *Out stat)
            fn mix(a [u32; 4], b [u8; (1, 8)])
        }";
        let outcome = parse_ok(src);
        let stat = &outcome.groups[0].decls[0];
        assert_eq!(
            stat.params[0].ty,
            RawType::Pointer {
                direction: Some(RawDirection::In),
                inner: Box::new(RawType::Name("cstr".into())),
            }
        );
        let mix = &outcome.groups[0].decls[1];
        assert_eq!(
            mix.params[0].ty,
            RawType::Array {
                element: Box::new(RawType::Name("u32".into())),
                size: RawArraySize::Fixed(4),
            }
        );
        assert_eq!(
            mix.params[1].ty,
            RawType::Array {
                element: Box::new(RawType::Name("u8".into())),
                size: RawArraySize::Range { min: 1, max: 8 },
            }
        );
    }

    #[test]
    fn string_domains_and_ranges() {
        let src = r#"group G {
            fn open(file *In filename{"/dev/kvm", "/dev/null"}, flags u32{(0, 3)})
        }"#;
        let outcome = parse_ok(src);
        let decl = &outcome.groups[0].decls[0];
        match &decl.params[0].ty {
            RawType::Pointer { inner, .. } => match inner.as_ref() {
                RawType::WithDomain { name, domain } => {
                    assert_eq!(name, "filename");
                    assert_eq!(
                        *domain,
                        RawDomain::StrSet(vec!["/dev/kvm".into(), "/dev/null".into()])
                    );
                }
                other => panic!("unexpected inner type {other:?}"),
            },
            other => panic!("unexpected type {other:?}"),
        }
        assert_eq!(
            decl.params[1].ty,
            RawType::WithDomain {
                name: "u32".into(),
                domain: RawDomain::IntRange { lo: 0, hi: 3 },
            }
        );
    }

    #[test]
    fn annotations_id_and_opaque() {
        let src = r#"group G {
            #[id(16)]
            #[inc("sys/ioctl.h")]
            fn ioctl@TCGETS(fd fd_t, cmd i32{0x5401})
        }"#;
        let outcome = parse_ok(src);
        let decl = &outcome.groups[0].decls[0];
        assert_eq!(decl.ident, Some(16));
        assert_eq!(decl.annotations, vec![r#"inc("sys/ioctl.h")"#.to_string()]);
    }

    #[test]
    fn comments_anywhere_and_commented_out_decl_absent() {
        let src = r"group G { // trailing
            /* a whole declaration, gone:
            fn gone(x i32)
            */
            fn kept(/* inline */ x i32 /* after type */)
        }";
        let outcome = parse_ok(src);
        assert_eq!(outcome.groups[0].decls.len(), 1);
        assert_eq!(outcome.groups[0].decls[0].name, "kept");
    }

    #[test]
    fn bad_declaration_recovers_and_reports_position() {
        let src = "group G {\n    fn broken(x i32,,)\n    fn fine(y u8)\n}";
        let outcome = parse(src);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 2);
        let names: Vec<_> = outcome.groups[0].decls.iter().map(|d| &d.name).collect();
        assert_eq!(names, vec!["fine"]);
    }

    #[test]
    fn unterminated_group_reported() {
        let outcome = parse("group G { fn a()");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("unterminated group"));
    }

    #[test]
    fn text_outside_groups_reported() {
        let outcome = parse("fn stray() group G { fn a() }");
        assert!(!outcome.errors.is_empty());
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].decls[0].name, "a");
    }

    #[test]
    fn len_is_a_valid_parameter_name() {
        let outcome = parse_ok("group G { fn trim(fd fd_t, len u32) }");
        let decl = &outcome.groups[0].decls[0];
        assert_eq!(decl.params[1].name, "len");
        assert_eq!(decl.params[1].ty, RawType::Name("u32".into()));
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        let outcome = parse("  // nothing here\n");
        assert!(outcome.groups.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
