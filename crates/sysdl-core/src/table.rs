//! The declaration table.
//!
//! One validated entry per `(name, variant)` key. Backed by a `BTreeMap` so
//! iteration order is deterministic and loading identical text twice yields
//! structurally equal tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::operation::{Operation, OperationKey};

/// Table of all accepted operation declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclTable {
    ops: BTreeMap<OperationKey, Operation>,
}

impl DeclTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an operation, failing if its key is already taken.
    ///
    /// The error identifies both occurrences by their groups.
    pub fn insert(&mut self, op: Operation) -> Result<(), ModelError> {
        if let Some(existing) = self.ops.get(&op.key) {
            return Err(ModelError::DuplicateDeclaration {
                key: op.key.clone(),
                first_group: existing.group.clone(),
                second_group: op.group.clone(),
            });
        }
        self.ops.insert(op.key.clone(), op);
        Ok(())
    }

    /// Operation by key.
    pub fn get(&self, key: &OperationKey) -> Option<&Operation> {
        self.ops.get(key)
    }

    /// Operation by `name`/`name@variant` spelling.
    pub fn lookup(&self, text: &str) -> Option<&Operation> {
        self.ops.get(&OperationKey::parse(text))
    }

    /// Iterate operations in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.values()
    }

    /// Iterate keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &OperationKey> {
        self.ops.keys()
    }

    /// Number of accepted operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
