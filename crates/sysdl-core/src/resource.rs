//! The resource dependency graph.
//!
//! Classifies every `ResourceHandle` occurrence across the table as a
//! producer (the kind appears in a return slot) or a consumer (the kind
//! appears in an input parameter, possibly behind a pointer or buffer).
//! Built once from a full table and read-only afterwards; synthesis
//! sessions share it without locking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::OperationKey;
use crate::registry::TypeRegistry;
use crate::table::DeclTable;

/// One consuming site: an operation plus the parameter that wants the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    pub op: OperationKey,
    pub param: String,
}

/// Kind-keyed producer/consumer index over a declaration table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    producers: BTreeMap<String, Vec<OperationKey>>,
    consumers: BTreeMap<String, Vec<Consumer>>,
}

impl ResourceGraph {
    /// Index every resource-kind occurrence in `table`.
    pub fn build(table: &DeclTable) -> Self {
        let mut graph = ResourceGraph::default();
        for op in table.iter() {
            if let Some(ret) = &op.ret {
                for kind in ret.resource_kinds() {
                    graph
                        .producers
                        .entry(kind.to_string())
                        .or_default()
                        .push(op.key.clone());
                }
            }
            for param in &op.params {
                for kind in param.ty.resource_kinds() {
                    graph
                        .consumers
                        .entry(kind.to_string())
                        .or_default()
                        .push(Consumer {
                            op: op.key.clone(),
                            param: param.name.clone(),
                        });
                }
            }
        }
        graph
    }

    /// Operations returning a handle of `kind`.
    pub fn producers_of(&self, kind: &str) -> &[OperationKey] {
        self.producers.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sites consuming a handle of `kind`.
    pub fn consumers_of(&self, kind: &str) -> &[Consumer] {
        self.consumers.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every kind mentioned anywhere in the table, in name order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self
            .producers
            .keys()
            .chain(self.consumers.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter()
    }

    /// Kinds with consumers but neither a producer nor a registry stand-in.
    ///
    /// Non-fatal: handles of such kinds can still be supplied out of band,
    /// so callers surface this as a warning, not an error.
    pub fn orphaned_kinds(&self, registry: &TypeRegistry) -> Vec<&str> {
        self.consumers
            .keys()
            .filter(|kind| {
                self.producers_of(kind).is_empty() && registry.stand_in(kind).is_none()
            })
            .map(String::as_str)
            .collect()
    }
}
