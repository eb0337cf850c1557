//! Lexical analysis for catalogue text.
//!
//! Tokenization uses logos. Whitespace and comments (`//` line, `/* */`
//! block) are stripped at this layer and never reach the parser, so a fully
//! commented-out declaration is simply absent from the token stream.

use std::fmt;

use logos::Logos;

/// Catalogue token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    // === Keywords ===
    /// Keyword `group`
    #[token("group")]
    Group,
    /// Keyword `fn`
    #[token("fn")]
    Fn,
    /// Keyword `len`
    #[token("len")]
    Len,
    /// Pointer qualifier `In`
    #[token("In")]
    DirIn,
    /// Pointer qualifier `Out`
    #[token("Out")]
    DirOut,
    /// Pointer qualifier `InOut`
    #[token("InOut")]
    DirInOut,

    // === Punctuation ===
    /// Variant tag marker `@`
    #[token("@")]
    At,
    /// Annotation opener `#[`
    #[token("#[")]
    AttrStart,
    #[token("*")]
    Star,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("-")]
    Minus,

    // === Literals ===
    /// Integer literal, decimal or hex. Negation is a separate `-` token.
    #[regex(r"0x[0-9a-fA-F]+", |lex| i128::from_str_radix(&lex.slice()[2..], 16).ok())]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i128>().ok())]
    Integer(i128),

    /// Double-quoted string literal with `\n \r \t \\ \"` escapes.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len() - 1])
    })]
    String(String),

    /// Identifier: type names, parameter names, group names.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Group => write!(f, "'group'"),
            Token::Fn => write!(f, "'fn'"),
            Token::Len => write!(f, "'len'"),
            Token::DirIn => write!(f, "'In'"),
            Token::DirOut => write!(f, "'Out'"),
            Token::DirInOut => write!(f, "'InOut'"),
            Token::At => write!(f, "'@'"),
            Token::AttrStart => write!(f, "'#['"),
            Token::Star => write!(f, "'*'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
            Token::Minus => write!(f, "'-'"),
            Token::Integer(v) => write!(f, "integer {v}"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
        }
    }
}

fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn lex_all(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(lex_all("fn"), vec![Token::Fn]);
        assert_eq!(lex_all("fnord"), vec![Token::Ident("fnord".into())]);
        assert_eq!(lex_all("In"), vec![Token::DirIn]);
        assert_eq!(lex_all("Inner"), vec![Token::Ident("Inner".into())]);
    }

    #[test]
    fn integers_decimal_and_hex() {
        assert_eq!(lex_all("17"), vec![Token::Integer(17)]);
        assert_eq!(lex_all("0xae41"), vec![Token::Integer(0xae41)]);
        assert_eq!(
            lex_all("-3"),
            vec![Token::Minus, Token::Integer(3)]
        );
    }

    #[test]
    fn comments_are_inert() {
        let src = "fn // trailing\n /* block\n spanning */ group";
        assert_eq!(lex_all(src), vec![Token::Fn, Token::Group]);
        assert!(lex_all("// only a comment\n").is_empty());
    }

    #[test]
    fn strings_unescape() {
        assert_eq!(
            lex_all(r#""/dev/kvm""#),
            vec![Token::String("/dev/kvm".into())]
        );
        assert_eq!(
            lex_all(r#""a\"b""#),
            vec![Token::String("a\"b".into())]
        );
    }

    #[test]
    fn attribute_opener_is_one_token() {
        assert_eq!(
            lex_all("#[id(16)]"),
            vec![
                Token::AttrStart,
                Token::Ident("id".into()),
                Token::LParen,
                Token::Integer(16),
                Token::RParen,
                Token::RBracket,
            ]
        );
    }
}
