//! Core description model for system-interface catalogues.
//!
//! A catalogue declares several hundred operating-system entry points
//! (syscalls, device ioctls, socket operations) in a compact description
//! language. This crate is the typed model a consumer works against: the
//! closed [`TypeDescriptor`] union, [`Operation`] declarations keyed by
//! `(name, variant)` in a [`DeclTable`], the load-time [`TypeRegistry`] of
//! named resource kinds and struct layouts, and the [`ResourceGraph`]
//! producer/consumer index.
//!
//! The model is built once at load time and is immutable afterwards: all
//! types here are plain owned data, `Send + Sync`, and safe to share across
//! unbounded concurrent synthesis sessions without locking.

pub mod error;
pub mod operation;
pub mod registry;
pub mod resource;
pub mod table;
pub mod types;

pub use error::ModelError;
pub use operation::{Operation, OperationKey, Param, ParamRole};
pub use registry::{ResourceKindDef, StructDef, TypeRegistry};
pub use resource::{Consumer, ResourceGraph};
pub use table::DeclTable;
pub use types::{
    Direction, Domain, ScalarType, Signedness, SizePolicy, StringKind, TypeDescriptor,
};
