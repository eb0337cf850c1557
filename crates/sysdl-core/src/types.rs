//! The sysdl type universe.
//!
//! Every parameter and return slot of a cataloged operation carries a
//! [`TypeDescriptor`]: a closed tagged union covering scalars, constrained
//! constant domains, directed pointers, sized buffers, literal string/path
//! domains, opaque resource handles, and size-only struct records. Consumers
//! match the union exhaustively; there is no open-ended extension point.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signedness of an integer scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// An integer scalar with explicit width and signedness.
///
/// Widths are limited to the machine-word family (8/16/32/64); the catalogue
/// format has no wider scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarType {
    /// Width in bits: 8, 16, 32, or 64.
    pub width: u8,
    pub signedness: Signedness,
}

impl ScalarType {
    pub const I8: ScalarType = ScalarType::new(8, Signedness::Signed);
    pub const I16: ScalarType = ScalarType::new(16, Signedness::Signed);
    pub const I32: ScalarType = ScalarType::new(32, Signedness::Signed);
    pub const I64: ScalarType = ScalarType::new(64, Signedness::Signed);
    pub const U8: ScalarType = ScalarType::new(8, Signedness::Unsigned);
    pub const U16: ScalarType = ScalarType::new(16, Signedness::Unsigned);
    pub const U32: ScalarType = ScalarType::new(32, Signedness::Unsigned);
    pub const U64: ScalarType = ScalarType::new(64, Signedness::Unsigned);

    pub const fn new(width: u8, signedness: Signedness) -> Self {
        Self { width, signedness }
    }

    /// Resolve a scalar name (`i8` … `u64`) to its type, if it is one.
    pub fn from_name(name: &str) -> Option<ScalarType> {
        match name {
            "i8" => Some(Self::I8),
            "i16" => Some(Self::I16),
            "i32" => Some(Self::I32),
            "i64" => Some(Self::I64),
            "u8" => Some(Self::U8),
            "u16" => Some(Self::U16),
            "u32" => Some(Self::U32),
            "u64" => Some(Self::U64),
            _ => None,
        }
    }

    /// Smallest representable value.
    pub fn min_value(&self) -> i128 {
        match self.signedness {
            Signedness::Unsigned => 0,
            Signedness::Signed => -(1i128 << (self.width - 1)),
        }
    }

    /// Largest representable value.
    pub fn max_value(&self) -> i128 {
        match self.signedness {
            Signedness::Unsigned => (1i128 << self.width) - 1,
            Signedness::Signed => (1i128 << (self.width - 1)) - 1,
        }
    }

    /// Whether `value` is representable in this scalar.
    pub fn fits(&self, value: i128) -> bool {
        value >= self.min_value() && value <= self.max_value()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.signedness {
            Signedness::Signed => 'i',
            Signedness::Unsigned => 'u',
        };
        write!(f, "{}{}", prefix, self.width)
    }
}

/// Data direction of a pointer parameter.
///
/// `In`: the caller supplies the pointed-to data. `Out`: the callee
/// populates caller-provided storage. `InOut`: both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "In"),
            Direction::Out => write!(f, "Out"),
            Direction::InOut => write!(f, "InOut"),
        }
    }
}

/// Legal-value restriction on a scalar.
///
/// Ranges are inclusive on both ends. An empty set or an inverted range is
/// malformed and rejected at validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    /// Finite set of admissible values.
    Set(Vec<i128>),
    /// Inclusive range `lo..=hi`.
    Range { lo: i128, hi: i128 },
}

impl Domain {
    /// Whether `value` is a member of the domain.
    pub fn contains(&self, value: i128) -> bool {
        match self {
            Domain::Set(values) => values.contains(&value),
            Domain::Range { lo, hi } => value >= *lo && value <= *hi,
        }
    }

    /// Number of admissible values, saturating at `u128::MAX`.
    pub fn cardinality(&self) -> u128 {
        match self {
            Domain::Set(values) => values.len() as u128,
            Domain::Range { lo, hi } => {
                if hi < lo {
                    0
                } else {
                    (hi - lo) as u128 + 1
                }
            }
        }
    }
}

/// How a buffer's element count is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizePolicy {
    /// Exactly `N` elements.
    Fixed(u64),
    /// Any count in the inclusive range `min..=max`.
    Range { min: u64, max: u64 },
    /// The count is carried at runtime by another parameter of the same
    /// operation. The synthesizer derives that parameter from the buffer,
    /// never the reverse.
    LinkedToLength { param: String, width: ScalarType },
}

/// Flavor of a literal string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringKind {
    /// Generic NUL-terminated string (`cstr`).
    Str,
    /// Filesystem path (`filename`).
    Path,
}

impl StringKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            StringKind::Str => "cstr",
            StringKind::Path => "filename",
        }
    }
}

/// Canonical description of one parameter or return slot.
///
/// This union is closed: every consumer matches all variants, and adding a
/// variant is a breaking model change by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// Unconstrained integer scalar.
    Scalar(ScalarType),
    /// Scalar restricted to an explicit value domain.
    ConstantDomain { base: ScalarType, domain: Domain },
    /// Directed pointer wrapping a pointee description.
    Pointer {
        direction: Direction,
        pointee: Box<TypeDescriptor>,
    },
    /// Contiguous run of elements with a size policy.
    Buffer {
        element: Box<TypeDescriptor>,
        size: SizePolicy,
    },
    /// Literal string/path; an empty alternative list means unconstrained.
    StringLit {
        kind: StringKind,
        alternatives: Vec<String>,
    },
    /// Opaque handle of a named resource kind.
    ResourceHandle { kind: String },
    /// Composite record modeled only by name and byte size.
    OpaqueStruct { name: String, size: u64 },
}

impl TypeDescriptor {
    /// The scalar type, if this is a bare or domain-restricted scalar.
    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            TypeDescriptor::Scalar(s) => Some(*s),
            TypeDescriptor::ConstantDomain { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Whether this descriptor is an integer scalar (bare or constrained).
    pub fn is_integer_scalar(&self) -> bool {
        self.as_scalar().is_some()
    }

    /// The buffer descriptor reachable here, looking through at most one
    /// pointer. Length-links attach to buffers passed directly or by
    /// pointer; deeper nesting does not qualify.
    pub fn buffer_view(&self) -> Option<(&TypeDescriptor, &SizePolicy)> {
        match self {
            TypeDescriptor::Buffer { element, size } => Some((element, size)),
            TypeDescriptor::Pointer { pointee, .. } => match pointee.as_ref() {
                TypeDescriptor::Buffer { element, size } => Some((element, size)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Resource kinds mentioned anywhere in this descriptor, in
    /// encounter order.
    pub fn resource_kinds(&self) -> Vec<&str> {
        let mut kinds = Vec::new();
        self.collect_kinds(&mut kinds);
        kinds
    }

    fn collect_kinds<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeDescriptor::ResourceHandle { kind } => out.push(kind),
            TypeDescriptor::Pointer { pointee, .. } => pointee.collect_kinds(out),
            TypeDescriptor::Buffer { element, .. } => element.collect_kinds(out),
            TypeDescriptor::Scalar(_)
            | TypeDescriptor::ConstantDomain { .. }
            | TypeDescriptor::StringLit { .. }
            | TypeDescriptor::OpaqueStruct { .. } => {}
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(s) => write!(f, "{s}"),
            TypeDescriptor::ConstantDomain { base, domain } => match domain {
                Domain::Set(values) => {
                    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    write!(f, "{base}{{{}}}", rendered.join(","))
                }
                Domain::Range { lo, hi } => write!(f, "{base}{{({lo},{hi})}}"),
            },
            TypeDescriptor::Pointer { direction, pointee } => match direction {
                Direction::InOut => write!(f, "*{pointee}"),
                d => write!(f, "*{d} {pointee}"),
            },
            TypeDescriptor::Buffer { element, size } => match size {
                SizePolicy::Fixed(n) => write!(f, "[{element};{n}]"),
                SizePolicy::Range { min, max } => write!(f, "[{element};({min},{max})]"),
                SizePolicy::LinkedToLength { param, .. } => write!(f, "[{element};len={param}]"),
            },
            TypeDescriptor::StringLit { kind, alternatives } => {
                if alternatives.is_empty() {
                    write!(f, "{}", kind.type_name())
                } else {
                    let rendered: Vec<String> =
                        alternatives.iter().map(|a| format!("{a:?}")).collect();
                    write!(f, "{}{{{}}}", kind.type_name(), rendered.join(","))
                }
            }
            TypeDescriptor::ResourceHandle { kind } => write!(f, "{kind}"),
            TypeDescriptor::OpaqueStruct { name, .. } => write!(f, "{name}"),
        }
    }
}
