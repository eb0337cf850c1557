//! Registry TOML files.
//!
//! The type registry is an external collaborator of the loader; on the
//! command line it arrives as a TOML file naming resource kinds and opaque
//! structs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sysdl_core::TypeRegistry;

/// On-disk registry file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(rename = "resource", default)]
    pub resources: Vec<ResourceEntry>,
    #[serde(rename = "struct", default)]
    pub structs: Vec<StructEntry>,
}

/// One `[[resource]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    /// Literal usable where no producer handle is available.
    #[serde(rename = "stand-in", default)]
    pub stand_in: Option<i64>,
}

/// One `[[struct]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructEntry {
    pub name: String,
    pub size: u64,
}

impl RegistryFile {
    pub fn into_registry(self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for resource in self.resources {
            registry.register_resource(resource.name, resource.stand_in);
        }
        for entry in self.structs {
            registry.register_struct(entry.name, entry.size);
        }
        registry
    }
}

/// Load a registry from a TOML file.
pub fn load_registry(path: &Path) -> Result<TypeRegistry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading registry {}", path.display()))?;
    let file: RegistryFile =
        toml::from_str(&text).with_context(|| format!("parsing registry {}", path.display()))?;
    Ok(file.into_registry())
}

/// A commented example registry.
pub fn template() -> &'static str {
    r#"# sysdl type registry
#
# Resource kinds name opaque handles passed between operations. A kind
# with a stand-in can be consumed even when no producer ran earlier in
# the session.

[[resource]]
name = "fd_t"
stand-in = 0

[[resource]]
name = "kvmfd_t"

# Opaque structs are modeled by byte size only.

[[struct]]
name = "stat"
size = 144
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_round_trips() {
        let file: RegistryFile = toml::from_str(template()).unwrap();
        let registry = file.into_registry();
        assert_eq!(registry.stand_in("fd_t"), Some(0));
        assert_eq!(registry.stand_in("kvmfd_t"), None);
        assert_eq!(registry.struct_def("stat").map(|s| s.size), Some(144));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reg.toml");
        std::fs::write(&path, template()).unwrap();
        let registry = load_registry(&path).unwrap();
        assert!(registry.contains("fd_t"));
        assert!(registry.contains("stat"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_registry(Path::new("/nonexistent/reg.toml")).is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reg.toml");
        std::fs::write(&path, "[[[not toml").unwrap();
        assert!(load_registry(&path).is_err());
    }
}
