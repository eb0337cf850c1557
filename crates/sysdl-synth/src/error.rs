//! Synthesis error types.
//!
//! Every synthesis failure names one parameter and one cause. Recovery is
//! the caller's business (typically: register a stand-in for the missing
//! kind and retry); this layer performs no retries.

use serde::{Deserialize, Serialize};

use sysdl_core::OperationKey;

/// Report of the one constraint an explicit invalid-mode synthesis chose
/// to violate. Never produced silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub parameter: String,
    /// Which constraint class was violated, e.g. `constant-domain`,
    /// `fixed-size`, `size-range`, `length-link`, `string-domain`.
    pub constraint: String,
    pub detail: String,
}

/// Errors raised during synthesis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    /// The requested key is not in the table.
    #[error("unknown operation '{key}'")]
    UnknownOperation { key: OperationKey },

    /// An input handle has no prior producer in the session and the kind
    /// declares no stand-in.
    #[error("parameter '{param}': no source for resource kind '{kind}': no handle produced earlier in the session and no registry stand-in")]
    UnsatisfiableResource { kind: String, param: String },

    /// A pinned scalar lies outside the parameter's domain; valid
    /// synthesis refuses rather than silently violating the model.
    #[error("parameter '{param}': pinned value {value} lies outside the declared domain")]
    PinOutOfDomain { param: String, value: i128 },

    /// A pinned buffer length is incompatible with the size policy or the
    /// link width.
    #[error("parameter '{param}': pinned length {count} is not admissible: {detail}")]
    PinOutOfRange {
        param: String,
        count: u64,
        detail: String,
    },

    /// A pin targets a length-link parameter, whose value is always
    /// derived from its buffer.
    #[error("parameter '{param}' is a length-link target; its value is derived from the buffer, not chosen")]
    PinnedLengthLink { param: String },

    /// Invalid mode was asked to violate a parameter with no violable
    /// constraint.
    #[error("parameter '{param}' of '{key}' carries no violable constraint")]
    NothingToViolate { key: OperationKey, param: String },

    /// Invalid mode named a parameter the operation does not have.
    #[error("operation '{key}' has no parameter '{param}'")]
    UnknownParameter { key: OperationKey, param: String },

    /// OS entropy was unavailable while seeding the session RNG.
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] getrandom::Error),
}
