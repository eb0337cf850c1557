//! Synthesized values.
//!
//! An [`ArgumentAssignment`] is the machine-readable product of one
//! synthesis: the operation key plus one concrete [`ArgValue`] per
//! parameter, serializable for downstream consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

use sysdl_core::{Direction, OperationKey};

/// Where a resource-handle value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleOrigin {
    /// Bound to the result of an earlier call in the same session,
    /// identified by its session call index.
    Result { call: usize },
    /// The registry's literal stand-in for the kind.
    StandIn { value: i64 },
}

/// One concrete synthesized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    Int(i128),
    Str(String),
    /// Byte buffers (8-bit element buffers, struct blocks).
    Bytes(Vec<u8>),
    /// Buffers of wider or constrained elements.
    Array(Vec<ArgValue>),
    Handle {
        kind: String,
        origin: HandleOrigin,
    },
    Struct {
        name: String,
        bytes: Vec<u8>,
    },
    Pointer {
        direction: Direction,
        pointee: Box<ArgValue>,
    },
}

impl ArgValue {
    /// Element count of a buffer-shaped value, looking through one
    /// pointer.
    pub fn buffer_len(&self) -> Option<usize> {
        match self {
            ArgValue::Bytes(bytes) => Some(bytes.len()),
            ArgValue::Array(items) => Some(items.len()),
            ArgValue::Pointer { pointee, .. } => pointee.buffer_len(),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::Str(s) => write!(f, "{s:?}"),
            ArgValue::Bytes(bytes) => {
                write!(f, "bytes[{}]", bytes.len())?;
                if !bytes.is_empty() {
                    write!(f, " ")?;
                    for b in bytes.iter().take(8) {
                        write!(f, "{b:02x}")?;
                    }
                    if bytes.len() > 8 {
                        write!(f, "..")?;
                    }
                }
                Ok(())
            }
            ArgValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ArgValue::Handle { kind, origin } => match origin {
                HandleOrigin::Result { call } => write!(f, "<{kind}:call#{call}>"),
                HandleOrigin::StandIn { value } => write!(f, "<{kind}:{value}>"),
            },
            ArgValue::Struct { name, bytes } => write!(f, "{name}{{{} bytes}}", bytes.len()),
            ArgValue::Pointer { direction, pointee } => match direction {
                Direction::InOut => write!(f, "&{pointee}"),
                Direction::In => write!(f, "&in {pointee}"),
                Direction::Out => write!(f, "&out {pointee}"),
            },
        }
    }
}

/// A named argument slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArg {
    pub name: String,
    pub value: ArgValue,
}

/// One synthesized call: concrete, constraint-satisfying values for every
/// parameter of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentAssignment {
    pub op: OperationKey,
    /// Session call index this assignment was produced at.
    pub call: usize,
    pub args: Vec<NamedArg>,
    /// Resource kind the operation's return slot produces, if any.
    pub produces: Option<String>,
}

impl ArgumentAssignment {
    /// Value of the named argument.
    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }
}

impl fmt::Display for ArgumentAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", arg.name, arg.value)?;
        }
        write!(f, ")")?;
        if let Some(kind) = &self.produces {
            write!(f, " -> {kind}")?;
        }
        Ok(())
    }
}
