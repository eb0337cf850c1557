//! Parser front end for system-interface catalogues.
//!
//! Turns catalogue text into raw declarations: `group` blocks of `fn`
//! declarations with unresolved type expressions. Resolution against the
//! type registry and all cross-reference checking happen in the loader;
//! this crate knows only the grammar.
//!
//! ```
//! let outcome = sysdl_parser::parse(
//!     "group Files { fn write(fd fd_t, buf *[i8], count len<i32, buf>) }",
//! );
//! assert!(outcome.errors.is_empty());
//! assert_eq!(outcome.groups[0].decls[0].name, "write");
//! ```

pub mod ast;
pub mod error;
pub mod parser;
pub mod stream;
pub mod token;

pub use ast::{
    RawAnnotation, RawArraySize, RawDecl, RawDirection, RawDomain, RawGroup, RawParam, RawType,
    Span,
};
pub use error::SyntaxError;
pub use parser::{parse, ParseOutcome};
pub use token::Token;
