//! Error types for model construction.

use crate::operation::OperationKey;

/// Errors raised while assembling the description model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Two declarations share a `(name, variant)` key.
    #[error(
        "duplicate declaration of '{key}': first in group '{first_group}', again in group '{second_group}'"
    )]
    DuplicateDeclaration {
        key: OperationKey,
        /// Group of the declaration already in the table.
        first_group: String,
        /// Group of the rejected declaration.
        second_group: String,
    },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
