//! Operations and parameters.
//!
//! An [`Operation`] is one declared callable target — a syscall, an ioctl
//! on a device, a socket call. Variant-tagged declarations sharing an
//! underlying identifier are independent operations with an optional shared
//! `ident`; they are not alternate parameter lists of one entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{SizePolicy, TypeDescriptor};

/// Unique key of an operation: name plus optional variant tag.
///
/// An absent variant is itself a valid key, so `open` and `open@large` are
/// distinct table entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub name: String,
    pub variant: Option<String>,
}

impl OperationKey {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: None,
        }
    }

    pub fn with_variant(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Some(variant.into()),
        }
    }

    /// Parse a `name` or `name@variant` spelling.
    pub fn parse(text: &str) -> Self {
        match text.split_once('@') {
            Some((name, variant)) => Self::with_variant(name, variant),
            None => Self::plain(text),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Role a parameter plays in its operation, derived from its descriptor
/// and the surrounding parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamRole {
    /// Plain by-value argument.
    Value,
    /// Pointer whose data the caller supplies.
    PointerIn,
    /// Pointer to storage the callee populates.
    PointerOut,
    /// Pointer read and written by the callee.
    PointerInOut,
    /// Scalar bound to another parameter's data size.
    LengthLink,
    /// Opaque handle of a resource kind.
    ResourceHandle,
}

impl fmt::Display for ParamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamRole::Value => "value",
            ParamRole::PointerIn => "ptr-in",
            ParamRole::PointerOut => "ptr-out",
            ParamRole::PointerInOut => "ptr-inout",
            ParamRole::LengthLink => "len-link",
            ParamRole::ResourceHandle => "resource",
        };
        write!(f, "{s}")
    }
}

/// One named parameter of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One declared callable target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub key: OperationKey,
    /// Fixed numeric identifier (e.g. a syscall number) shared by variants,
    /// set from an `#[id(N)]` attribute.
    pub ident: Option<u64>,
    pub params: Vec<Param>,
    pub ret: Option<TypeDescriptor>,
    /// Opaque annotation payloads attached to the declaration, preserved
    /// verbatim and never interpreted.
    pub annotations: Vec<String>,
    /// Name of the group the declaration appeared in.
    pub group: String,
}

impl Operation {
    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Index of a parameter by name.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Name of the parameter whose buffer links its length to `name`,
    /// if any.
    pub fn buffer_linked_to(&self, name: &str) -> Option<&str> {
        self.params.iter().find_map(|p| match p.ty.buffer_view() {
            Some((_, SizePolicy::LinkedToLength { param, .. })) if param == name => {
                Some(p.name.as_str())
            }
            _ => None,
        })
    }

    /// Derive the role of the parameter at `index`.
    ///
    /// A scalar referenced by some buffer's length link is a
    /// [`ParamRole::LengthLink`] regardless of its own descriptor.
    pub fn role_of(&self, index: usize) -> Option<ParamRole> {
        let param = self.params.get(index)?;
        if param.ty.is_integer_scalar() && self.buffer_linked_to(&param.name).is_some() {
            return Some(ParamRole::LengthLink);
        }
        Some(match &param.ty {
            TypeDescriptor::ResourceHandle { .. } => ParamRole::ResourceHandle,
            TypeDescriptor::Pointer { direction, .. } => match direction {
                crate::types::Direction::In => ParamRole::PointerIn,
                crate::types::Direction::Out => ParamRole::PointerOut,
                crate::types::Direction::InOut => ParamRole::PointerInOut,
            },
            _ => ParamRole::Value,
        })
    }

    /// Resource kind produced by this operation's return slot, if any.
    pub fn produced_kind(&self) -> Option<&str> {
        self.ret.as_ref()?.resource_kinds().first().copied()
    }
}
