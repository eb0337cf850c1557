//! The load-time type registry.
//!
//! Resource kinds and opaque struct layouts are not declared in catalogue
//! text; they are supplied by the embedding tool as an external collaborator
//! and resolved against during descriptor building.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named resource kind, optionally with a literal stand-in value usable
/// when no producing operation is available in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKindDef {
    pub name: String,
    pub stand_in: Option<i64>,
}

/// A named opaque struct, modeled only by its byte size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    pub size: u64,
}

/// Registry of named base types resolvable from catalogue text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRegistry {
    resources: BTreeMap<String, ResourceKindDef>,
    structs: BTreeMap<String, StructDef>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Registration ---

    /// Register a resource kind. Re-registration replaces the entry.
    pub fn register_resource(&mut self, name: impl Into<String>, stand_in: Option<i64>) {
        let name = name.into();
        self.resources.insert(
            name.clone(),
            ResourceKindDef {
                name,
                stand_in,
            },
        );
    }

    /// Register an opaque struct. Re-registration replaces the entry.
    pub fn register_struct(&mut self, name: impl Into<String>, size: u64) {
        let name = name.into();
        self.structs.insert(name.clone(), StructDef { name, size });
    }

    // --- Lookup ---

    /// Resource kind definition by name.
    pub fn resource(&self, name: &str) -> Option<&ResourceKindDef> {
        self.resources.get(name)
    }

    /// Struct definition by name.
    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    /// Whether `name` resolves to any registered type.
    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name) || self.structs.contains_key(name)
    }

    /// Literal stand-in for a resource kind, if one is declared.
    pub fn stand_in(&self, kind: &str) -> Option<i64> {
        self.resources.get(kind).and_then(|r| r.stand_in)
    }

    /// Iterate registered resource kinds in name order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceKindDef> {
        self.resources.values()
    }

    /// Iterate registered structs in name order.
    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values()
    }
}
