//! Value synthesis over validated catalogue models.
//!
//! Given an immutable [`Model`](sysdl_load::Model) and a [`Policy`], a
//! [`Session`] produces concrete, constraint-satisfying argument
//! assignments for cataloged operations. Across a sequence, resource
//! handles produced by earlier calls bind to later consumers; a kind with
//! no prior producer falls back to its registry stand-in or fails naming
//! the parameter and the kind.
//!
//! Successful synthesis satisfies every static constraint in the model; it
//! says nothing about whether the call succeeds on a live target. The
//! explicit invalid mode violates exactly one named constraint and always
//! reports which one.
//!
//! ```
//! use sysdl_core::{OperationKey, TypeRegistry};
//! use sysdl_synth::{Policy, Session};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_resource("fd_t", Some(0));
//! let model = sysdl_load::load(
//!     "group Files { fn write(fd fd_t, buf *[i8], count len<i32, buf>) }",
//!     &registry,
//! )
//! .unwrap();
//!
//! let mut session = Session::new(&model, Policy::uniform().with_seed(7)).unwrap();
//! let call = session.synthesize(&OperationKey::parse("write")).unwrap();
//! let len = call.arg("buf").unwrap().buffer_len().unwrap() as i128;
//! assert_eq!(call.arg("count").unwrap().as_int(), Some(len));
//! ```

pub mod error;
pub mod policy;
pub mod rng;
pub mod synth;
pub mod value;

pub use error::{ConstraintViolation, SynthesisError};
pub use policy::{Policy, ScalarStrategy};
pub use rng::Rng;
pub use synth::Session;
pub use value::{ArgValue, ArgumentAssignment, HandleOrigin, NamedArg};
